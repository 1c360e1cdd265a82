use super::{Engine, Reply};
use crate::config::EmailCommandConfig;
use crate::state::Participant;
use crate::state::names::substitute_arg;
use tracing::{info, warn};

impl Engine {
    /// `/<cmd> <address> [argument]` for a configured email command.
    pub(super) async fn cmd_email(
        &self,
        from: &Participant,
        cmd: &str,
        email: &EmailCommandConfig,
        args: &str,
    ) -> Reply {
        let usage = || {
            Reply::private(
                from,
                format!(
                    "Error: The format of the command is incorrect; Correct example: /{cmd} {}",
                    email.args_example
                ),
            )
        };

        let (to, arg) = args
            .split_once(char::is_whitespace)
            .map(|(to, arg)| (to, arg.trim()))
            .unwrap_or((args, ""));
        if to.is_empty() || !to.contains('@') {
            return usage();
        }

        let (subject, body) = if email.takes_arg() {
            if arg.is_empty() {
                return usage();
            }
            (
                substitute_arg(&email.subject, arg),
                substitute_arg(&email.body, arg),
            )
        } else {
            (email.subject.clone(), email.body.clone())
        };

        match self.email.send(&subject, &body, to).await {
            Ok(()) => {
                info!(command = %cmd, to = %to, by = %from, "Email sent");
                Reply::private(from, format!("{cmd}: Successfully sent email to {to}"))
            }
            Err(e) => {
                warn!(command = %cmd, to = %to, error = %e, "Email failed");
                Reply::private(from, format!("{cmd}: Failed to send email to {to}"))
            }
        }
    }
}
