use super::{Engine, Reply, Target};
use crate::state::{Participant, TrustLevel};
use tracing::{info, warn};

impl Engine {
    /// `/remember [level] <name>`; the level defaults to known.
    pub(super) async fn cmd_remember(&self, from: &Participant, args: &str) -> Reply {
        let (level, who) = match args.split_once(char::is_whitespace) {
            Some((word, rest)) => match TrustLevel::from_keyword(word) {
                Some(level) => (level, rest.trim()),
                None => (TrustLevel::Known, args),
            },
            None => (TrustLevel::Known, args),
        };
        if who.is_empty() {
            return Reply::private(
                from,
                "Please use the format: /remember [known|cohost|auto|admin] Name",
            );
        }

        let name = self.trust_name(from, who).await;
        match self.trust.set(&name, level) {
            Ok(true) => {
                info!(name = %name, level = %level, by = %from, "Trust level set");
                Reply::private(from, format!("Remembered {name} as {level}"))
            }
            Ok(false) => Reply::private(from, format!("{name} is already remembered as {level}")),
            Err(e) => {
                warn!(name = %name, error = %e, "Failed to save the trust list");
                Reply::private(from, format!("Failed to remember {name}"))
            }
        }
    }

    /// `/forget <name>`
    pub(super) async fn cmd_forget(&self, from: &Participant, args: &str) -> Reply {
        if args.is_empty() {
            return Reply::private(from, "Please use the format: /forget Name");
        }

        let name = self.trust_name(from, args).await;
        match self.trust.set(&name, TrustLevel::Unknown) {
            Ok(true) => {
                info!(name = %name, by = %from, "Trust entry removed");
                Reply::private(from, format!("Forgot {name}"))
            }
            Ok(false) => Reply::private(from, format!("I don't know {name}")),
            Err(e) => {
                warn!(name = %name, error = %e, "Failed to save the trust list");
                Reply::private(from, format!("Failed to forget {name}"))
            }
        }
    }

    /// `me` and `#id` resolve to a display name; anything else is taken as
    /// written, so absent people can be remembered too.
    async fn trust_name(&self, from: &Participant, who: &str) -> String {
        match Target::parse(who) {
            Target::ByName(name) => name,
            target => match self.resolve_target(from, &target).await {
                Ok(p) => p.name,
                Err(_) => who.to_string(),
            },
        }
    }
}
