use super::{Engine, Moderation, Reply};
use crate::state::names::{day_label, normalize};
use crate::state::{Participant, Recipient};
use tracing::info;

impl Engine {
    /// Topic announcement, e.g. `Tonight's topic: Step 3`.
    pub(crate) fn topic_line(&self, st: &Moderation) -> String {
        match &st.topic {
            Some(topic) => format!("{} topic: {}", day_label(self.local_hour()), topic),
            None => "The topic has not been set".to_string(),
        }
    }

    /// `/topic`, `/topic <text>`, `/topic force <text>`, `/topic clear`.
    pub(super) async fn cmd_topic(
        &self,
        st: &mut Moderation,
        from: &Participant,
        args: &str,
    ) -> Reply {
        if args.is_empty() {
            return Reply::private(from, self.topic_line(st));
        }

        let (word, rest) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
        let word = word.trim_start_matches('/').to_lowercase();
        let rest = rest.trim();

        let reply = match word.as_str() {
            "force" if !rest.is_empty() => {
                self.change_topic(st, from, Some(rest.to_string())).await;
                format!("Topic forced to: {rest}")
            }
            "force" => "Please use the format: /topic force New Topic".to_string(),
            "clear" | "off" if rest.is_empty() => {
                if st.topic.is_none() {
                    "The topic has not been set; There is nothing to clear".to_string()
                } else {
                    self.change_topic(st, from, None).await;
                    "Topic cleared".to_string()
                }
            }
            _ => match &st.topic {
                Some(current) if current.eq_ignore_ascii_case(args) => {
                    format!("The topic is already set to: {current}")
                }
                Some(_) => "Topic is already set; Use /topic force to change it".to_string(),
                None => {
                    self.change_topic(st, from, Some(args.to_string())).await;
                    format!("Topic set to: {args}")
                }
            },
        };
        Reply::private(from, reply)
    }

    /// Replace the topic and tell everyone about a new one.
    async fn change_topic(&self, st: &mut Moderation, from: &Participant, topic: Option<String>) {
        info!(participant = %from, topic = ?topic, "Topic changed");
        st.topic = topic;
        st.topic_sent.clear();
        if st.topic.is_none() {
            return;
        }

        let line = self.topic_line(st);
        if !self.send(Recipient::EveryoneInMeeting, &line).await {
            return;
        }
        // Everyone present just saw it; only later arrivals need it privately.
        if let Ok(list) = self.control.participants().await {
            st.topic_sent.extend(
                list.iter()
                    .filter(|p| p.is_attending())
                    .map(|p| normalize(&p.name)),
            );
        }
    }
}
