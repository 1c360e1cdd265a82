//! Automation flags and the named modes derived from them.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::config::defaults::default_true;

/// Independently toggleable automation capabilities.
///
/// Deserializes from the `[automation]` config section; every flag
/// defaults to on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ModeFlags {
    #[serde(default = "default_true")]
    pub send_topic_on_join: bool,
    #[serde(default = "default_true")]
    pub rename_self: bool,
    #[serde(default = "default_true")]
    pub reclaim_host: bool,
    #[serde(default = "default_true")]
    pub process_participants: bool,
    #[serde(default = "default_true")]
    pub process_chat: bool,
    #[serde(default = "default_true")]
    pub cohost_known: bool,
    #[serde(default = "default_true")]
    pub admit_known: bool,
    #[serde(default = "default_true")]
    pub admit_others: bool,
    #[serde(default = "default_true")]
    pub converse: bool,
    #[serde(default = "default_true")]
    pub speak: bool,
    #[serde(default = "default_true")]
    pub unmute_self: bool,
}

impl ModeFlags {
    pub const ALL: Self = Self::uniform(true);
    pub const NONE: Self = Self::uniform(false);

    const fn uniform(on: bool) -> Self {
        Self {
            send_topic_on_join: on,
            rename_self: on,
            reclaim_host: on,
            process_participants: on,
            process_chat: on,
            cohost_known: on,
            admit_known: on,
            admit_others: on,
            converse: on,
            speak: on,
            unmute_self: on,
        }
    }

    /// Unknown participants are held in the waiting room.
    pub fn is_citadel(&self) -> bool {
        !self.admit_others
    }

    /// Nobody is admitted or promoted automatically.
    pub fn is_lockdown(&self) -> bool {
        !self.admit_others && !self.admit_known && !self.cohost_known
    }

    /// Every automation is off.
    pub fn is_passive(&self) -> bool {
        *self == Self::NONE
    }
}

impl Default for ModeFlags {
    fn default() -> Self {
        Self::ALL
    }
}

/// Named modes that can be switched from chat or the remote command file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Citadel,
    Lockdown,
    Passive,
    Pause,
    Debug,
}

impl Mode {
    /// Whether switching this mode also locks or unlocks the meeting.
    pub fn locks_meeting(self) -> bool {
        matches!(self, Mode::Citadel | Mode::Lockdown)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Citadel => "citadel",
            Mode::Lockdown => "lockdown",
            Mode::Passive => "passive",
            Mode::Pause => "pause",
            Mode::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for Mode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "citadel" => Ok(Mode::Citadel),
            "lockdown" | "lock" => Ok(Mode::Lockdown),
            "passive" => Ok(Mode::Passive),
            "pause" => Ok(Mode::Pause),
            "debug" => Ok(Mode::Debug),
            _ => Err(()),
        }
    }
}

/// Current automation state: flags plus the pause and debug switches.
#[derive(Debug, Clone, Default)]
pub struct ModeState {
    pub flags: ModeFlags,
    pub paused: bool,
    pub debug: bool,
}

impl ModeState {
    pub fn new(flags: ModeFlags, paused: bool, debug: bool) -> Self {
        Self { flags, paused, debug }
    }

    pub fn is_on(&self, mode: Mode) -> bool {
        match mode {
            Mode::Citadel => self.flags.is_citadel(),
            Mode::Lockdown => self.flags.is_lockdown(),
            Mode::Passive => self.flags.is_passive(),
            Mode::Pause => self.paused,
            Mode::Debug => self.debug,
        }
    }

    /// Switch `mode` on or off. Returns `false` when it already was.
    pub fn set(&mut self, mode: Mode, on: bool) -> bool {
        if self.is_on(mode) == on {
            return false;
        }

        match mode {
            Mode::Citadel => self.flags.admit_others = !on,
            Mode::Lockdown => {
                self.flags.admit_others = !on;
                self.flags.admit_known = !on;
                self.flags.cohost_known = !on;
            }
            Mode::Passive => self.flags = ModeFlags::uniform(!on),
            Mode::Pause => self.paused = on,
            Mode::Debug => self.debug = on,
        }
        true
    }
}
