use super::{Engine, Moderation, Reply, Target};
use crate::state::{Participant, Recipient};
use tracing::{info, warn};

impl Engine {
    /// `/speaker <target>` mutes everyone else; `/speaker off` undoes it.
    pub(super) async fn cmd_speaker(
        &self,
        st: &mut Moderation,
        from: &Participant,
        args: &str,
    ) -> Reply {
        if args.is_empty() {
            return Reply::private(from, "Please use the format: /speaker Name, or /speaker off");
        }

        if args.eq_ignore_ascii_case("off") {
            if st.speaker.take().is_none() {
                return Reply::private(from, "Speaker mode is already off");
            }
            if let Err(e) = self.control.set_allow_unmute_self(true).await {
                warn!(error = %e, "Failed to allow self-unmute");
            }
            info!(by = %from, "Speaker mode off");
            return Reply::private(from, "Speaker mode turned off");
        }

        let speaker = match self.resolve_target(from, &Target::parse(args)).await {
            Ok(p) => p,
            Err(reply) => return Reply::private(from, reply),
        };
        if !speaker.is_attending() {
            return Reply::private(from, format!("{} is not attending", speaker.name));
        }

        if let Err(e) = self.control.set_allow_unmute_self(false).await {
            warn!(error = %e, "Failed to disallow self-unmute");
        }

        let participants = match self.control.participants().await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "Cannot list participants for speaker mode");
                Vec::new()
            }
        };
        for p in participants.iter().filter(|p| {
            p.id != speaker.id && p.is_attending() && !p.is_self && !p.is_privileged()
        }) {
            if !p.audio_muted
                && let Err(e) = self.control.mute(p.id).await
            {
                warn!(participant = %p, error = %e, "Failed to mute for speaker mode");
            }
        }

        st.speaker = Some(speaker.id);
        if speaker.audio_muted
            && let Err(e) = self.control.unmute(speaker.id).await
        {
            warn!(participant = %speaker, error = %e, "Failed to unmute speaker");
            return Reply::private(from, format!("Failed to unmute {}", speaker.name));
        }
        info!(participant = %speaker, by = %from, "Speaker set");
        Reply::private(from, format!("Speaker set to {}", speaker.name))
    }

    /// `/say <text>` posts to everyone; `/speak <text>` also reads it aloud.
    ///
    /// Replies only when something went wrong; the posted text is the answer.
    pub(super) async fn cmd_speak(
        &self,
        from: &Participant,
        cmd: &str,
        args: &str,
    ) -> Option<Reply> {
        if args.is_empty() {
            return Some(Reply::private(
                from,
                format!("Please use the format: /{cmd} Some text"),
            ));
        }
        if !self.send(Recipient::EveryoneInMeeting, args).await {
            return Some(Reply::private(from, format!("{cmd}: Failed to send the message")));
        }
        if cmd == "speak" {
            self.sound.speak(args);
        }
        None
    }

    /// `/play <sound>`
    pub(super) fn cmd_play(&self, from: &Participant, args: &str) -> Reply {
        if args.is_empty() {
            return Reply::private(from, "Please use the format: /play sound-name");
        }
        self.sound.play(args);
        Reply::private(from, format!("Playing: {args}"))
    }
}
