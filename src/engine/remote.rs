//! Out-of-band command file.
//!
//! An operator drops a file with one command per line next to the bot;
//! the sweep reads it, deletes it and applies each line:
//!
//! ```text
//! citadel:on
//! pause:off
//! leave
//! ```

use super::{Engine, Moderation};
use crate::state::Mode;
use std::path::Path;
use std::str::FromStr;
use tracing::{error, info, warn};

/// One line of the command file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    SetMode(Mode, bool),
    /// Leave, handing host over if possible.
    Leave,
    /// End the meeting for everyone.
    EndForAll,
}

impl FromStr for RemoteCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim().to_ascii_lowercase();
        match line.as_str() {
            "exit" | "leave" => return Ok(RemoteCommand::Leave),
            "kill" | "end" => return Ok(RemoteCommand::EndForAll),
            _ => {}
        }

        let (name, state) = line.split_once(':').ok_or_else(|| line.clone())?;
        let mode: Mode = name.trim().parse().map_err(|_| line.clone())?;
        let on = match state.trim() {
            "on" => true,
            "off" => false,
            _ => return Err(line.clone()),
        };
        Ok(RemoteCommand::SetMode(mode, on))
    }
}

/// Read and delete the command file. A missing file yields no commands.
pub fn take_remote_lines(path: &Path) -> std::io::Result<Vec<String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    std::fs::remove_file(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

impl Engine {
    pub(crate) async fn poll_remote_commands(&self, st: &mut Moderation) {
        let path = &self.config.files.remote_commands;
        let lines = match take_remote_lines(path) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read the remote command file");
                return;
            }
        };

        for line in lines {
            match line.parse::<RemoteCommand>() {
                Ok(RemoteCommand::SetMode(mode, on)) => {
                    info!(command = %line, "Remote command");
                    self.apply_mode(st, mode, on).await;
                }
                Ok(RemoteCommand::Leave) => {
                    info!(command = %line, "Remote command");
                    self.request_leave(false);
                }
                Ok(RemoteCommand::EndForAll) => {
                    info!(command = %line, "Remote command");
                    self.request_leave(true);
                }
                Err(_) => error!(command = %line, "Unknown remote command"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_lines() {
        assert_eq!("citadel:on".parse(), Ok(RemoteCommand::SetMode(Mode::Citadel, true)));
        assert_eq!(" Pause : OFF ".parse(), Ok(RemoteCommand::SetMode(Mode::Pause, false)));
        assert_eq!("passive:on".parse(), Ok(RemoteCommand::SetMode(Mode::Passive, true)));
        assert_eq!("exit".parse(), Ok(RemoteCommand::Leave));
        assert_eq!("END".parse(), Ok(RemoteCommand::EndForAll));
        assert!("citadel:maybe".parse::<RemoteCommand>().is_err());
        assert!("dance".parse::<RemoteCommand>().is_err());
    }

    #[test]
    fn test_take_deletes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("command_file.txt");
        std::fs::write(&path, "debug:on\n\nleave\n").unwrap();

        let lines = take_remote_lines(&path).unwrap();
        assert_eq!(lines, vec!["debug:on", "leave"]);
        assert!(!path.exists());
        assert!(take_remote_lines(&path).unwrap().is_empty());
    }
}
