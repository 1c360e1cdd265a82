//! Persisted trust levels keyed by normalized display name.
//!
//! File format, one entry per line:
//!
//! ```text
//! jane doe^          Admin
//! bob smith*         AutoCoHost
//! carol+             CoHost
//! dave|david jones   Known (aliases share the line's level)
//! ```

use super::names::normalize;
use crate::error::TrustStoreError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

/// Engine-side rank for a participant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TrustLevel {
    #[default]
    Unknown = 0,
    Known = 1,
    CoHost = 2,
    AutoCoHost = 3,
    Admin = 4,
}

impl TrustLevel {
    /// Numeric rank, used by host-handoff scoring.
    pub fn rank(self) -> u32 {
        self as u32
    }

    fn marker(self) -> &'static str {
        match self {
            TrustLevel::Admin => "^",
            TrustLevel::AutoCoHost => "*",
            TrustLevel::CoHost => "+",
            TrustLevel::Known | TrustLevel::Unknown => "",
        }
    }

    fn from_marker(c: char) -> Option<Self> {
        match c {
            '^' => Some(TrustLevel::Admin),
            '*' => Some(TrustLevel::AutoCoHost),
            '+' => Some(TrustLevel::CoHost),
            _ => None,
        }
    }

    /// Parse a level keyword as typed in chat.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "known" | "user" => Some(TrustLevel::Known),
            "cohost" | "co-host" => Some(TrustLevel::CoHost),
            "auto" | "autocohost" => Some(TrustLevel::AutoCoHost),
            "admin" => Some(TrustLevel::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrustLevel::Unknown => "unknown",
            TrustLevel::Known => "known",
            TrustLevel::CoHost => "co-host",
            TrustLevel::AutoCoHost => "auto co-host",
            TrustLevel::Admin => "admin",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Default)]
struct TrustTable {
    levels: HashMap<String, TrustLevel>,
    loaded_mtime: Option<SystemTime>,
}

/// Trust list backed by a text file.
///
/// One lock covers the table and its persistence so a `set` and its
/// write-back cannot interleave with a reload.
#[derive(Debug)]
pub struct TrustStore {
    path: PathBuf,
    table: Mutex<TrustTable>,
}

impl TrustStore {
    /// Create a store for `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: Mutex::new(TrustTable::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Level for `name`, `Unknown` if absent.
    pub fn get(&self, name: &str) -> TrustLevel {
        let key = normalize(name);
        self.table.lock().levels.get(&key).copied().unwrap_or_default()
    }

    /// Set the level for `name` and persist. `Unknown` removes the entry.
    ///
    /// Returns whether the stored level changed.
    pub fn set(&self, name: &str, level: TrustLevel) -> Result<bool, TrustStoreError> {
        let key = normalize(name);
        let mut table = self.table.lock();

        let previous = if level == TrustLevel::Unknown {
            table.levels.remove(&key)
        } else {
            table.levels.insert(key.clone(), level)
        };
        if previous.unwrap_or_default() == level {
            return Ok(false);
        }

        Self::write(&self.path, &mut table)?;
        info!(name = %key, level = %level, "Trust level updated");
        Ok(true)
    }

    /// Reload from disk if the file changed since the last load.
    ///
    /// Returns `true` when the table was replaced. A missing file is not
    /// an error; the table is left as it is.
    pub fn load(&self) -> Result<bool, TrustStoreError> {
        let mtime = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.modified()?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let mut table = self.table.lock();
        if table.loaded_mtime == Some(mtime) {
            return Ok(false);
        }

        let content = std::fs::read_to_string(&self.path)?;
        table.levels = parse(&content);
        table.loaded_mtime = Some(mtime);
        debug!(path = %self.path.display(), entries = table.levels.len(), "Trust list loaded");
        Ok(true)
    }

    /// Rewrite the whole file from the in-memory table.
    pub fn save(&self) -> Result<(), TrustStoreError> {
        let mut table = self.table.lock();
        Self::write(&self.path, &mut table)
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.table.lock().levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(path: &Path, table: &mut TrustTable) -> Result<(), TrustStoreError> {
        std::fs::write(path, render(&table.levels))?;
        table.loaded_mtime = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        Ok(())
    }
}

fn parse(content: &str) -> HashMap<String, TrustLevel> {
    let mut levels = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (names, level) = match line.chars().last().and_then(TrustLevel::from_marker) {
            Some(level) => (&line[..line.len() - 1], level),
            None => (line, TrustLevel::Known),
        };

        for alias in names.split('|') {
            let key = normalize(alias);
            if key.is_empty() {
                continue;
            }
            let entry = levels.entry(key).or_insert(level);
            *entry = (*entry).max(level);
        }
    }

    levels
}

fn render(levels: &HashMap<String, TrustLevel>) -> String {
    let mut entries: Vec<_> = levels.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut out = String::new();
    for (name, level) in entries {
        out.push_str(name);
        out.push_str(level.marker());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_markers_aliases_and_duplicates() {
        let levels = parse("Jane Doe^\nbob*\n\ncarol+\ndave|David Jones\ndave+\n");
        assert_eq!(levels.get("jane doe"), Some(&TrustLevel::Admin));
        assert_eq!(levels.get("bob"), Some(&TrustLevel::AutoCoHost));
        assert_eq!(levels.get("carol"), Some(&TrustLevel::CoHost));
        assert_eq!(levels.get("david jones"), Some(&TrustLevel::Known));
        // duplicate keeps the highest level
        assert_eq!(levels.get("dave"), Some(&TrustLevel::CoHost));
    }

    #[test]
    fn test_get_normalizes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("good_users.txt");
        std::fs::write(&path, "john d^\n").unwrap();

        let store = TrustStore::new(&path);
        assert!(store.load().unwrap());
        assert_eq!(store.get("John D. (Usher)"), TrustLevel::Admin);
        assert_eq!(store.get("someone else"), TrustLevel::Unknown);
    }

    #[test]
    fn test_load_skips_unchanged_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("good_users.txt");
        std::fs::write(&path, "alice\n").unwrap();

        let store = TrustStore::new(&path);
        assert!(store.load().unwrap());
        assert!(!store.load().unwrap());
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let store = TrustStore::new(dir.path().join("absent.txt"));
        assert!(!store.load().unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_persists_sorted_with_markers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("good_users.txt");
        let store = TrustStore::new(&path);

        assert!(store.set("Zed", TrustLevel::Known).unwrap());
        assert!(store.set("Amy (Chair)", TrustLevel::Admin).unwrap());
        assert!(store.set("Max", TrustLevel::AutoCoHost).unwrap());
        assert!(!store.set("amy", TrustLevel::Admin).unwrap());

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "amy^\nmax*\nzed\n");

        assert!(store.set("Zed", TrustLevel::Unknown).unwrap());
        assert_eq!(store.get("zed"), TrustLevel::Unknown);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "amy^\nmax*\n");
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("good_users.txt");
        let store = TrustStore::new(&path);
        store.set("Carol", TrustLevel::CoHost).unwrap();

        let reopened = TrustStore::new(&path);
        reopened.load().unwrap();
        assert_eq!(reopened.get("carol"), TrustLevel::CoHost);
    }

    #[test]
    fn test_level_ordering() {
        assert!(TrustLevel::Unknown < TrustLevel::Known);
        assert!(TrustLevel::Known < TrustLevel::CoHost);
        assert!(TrustLevel::CoHost < TrustLevel::AutoCoHost);
        assert!(TrustLevel::AutoCoHost < TrustLevel::Admin);
        assert_eq!(TrustLevel::Admin.rank(), 4);
    }
}
