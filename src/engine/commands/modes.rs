use super::{Engine, Moderation, Reply, on_off};
use crate::state::{Mode, Participant};
use tracing::info;

impl Engine {
    /// `/citadel`, `/lockdown` and `/passive` with `on` or `off`.
    pub(super) async fn cmd_mode(
        &self,
        st: &mut Moderation,
        from: &Participant,
        cmd: &str,
        args: &str,
    ) -> Reply {
        let (Ok(mode), Some(on)) = (cmd.parse::<Mode>(), on_off(args)) else {
            return Reply::private(
                from,
                format!("Sorry, the {cmd} command requires either on or off as a parameter"),
            );
        };

        let state = if on { "on" } else { "off" };
        let name = capitalized(&mode.to_string());
        if self.apply_mode(st, mode, on).await {
            Reply::private(from, format!("{name} mode has been changed to {state}"))
        } else {
            Reply::private(from, format!("{name} mode is already {state}"))
        }
    }

    /// `/ids on|off`: show `#id` after names in listings.
    pub(super) fn cmd_ids(&self, st: &mut Moderation, from: &Participant, args: &str) -> Reply {
        let Some(on) = on_off(args) else {
            return Reply::private(
                from,
                "Sorry, the ids command requires either on or off as a parameter",
            );
        };
        let state = if on { "on" } else { "off" };
        if st.include_ids == on {
            return Reply::private(from, format!("Listing ids is already {state}"));
        }
        st.include_ids = on;
        Reply::private(from, format!("Listing ids has been changed to {state}"))
    }

    /// `/waitmsg <text>` sets the waiting room announcement; `off` clears it.
    pub(super) fn cmd_waitmsg(&self, st: &mut Moderation, from: &Participant, args: &str) -> Reply {
        if args.is_empty() || args.eq_ignore_ascii_case("off") {
            if st.waiting_message.take().is_some() {
                info!(participant = %from, "Waiting room message turned off");
                return Reply::private(from, "Waiting room message has been turned off");
            }
            return Reply::private(from, "Waiting room message is already off");
        }

        if st.waiting_message.as_deref() == Some(args) {
            return Reply::private(
                from,
                format!("Waiting room message is already set to:\n{args}"),
            );
        }
        info!(participant = %from, message = %args, "Waiting room message set");
        st.waiting_message = Some(args.to_string());
        st.last_waiting_announcement = None;
        Reply::private(from, format!("Waiting room message has been set to:\n{args}"))
    }
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
