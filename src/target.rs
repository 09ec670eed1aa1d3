//! The fixed application this tool targets: its process names and data folder.

use crate::error::{Result, StopError};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const APP_TITLE: &str = "StopAnyAds";

/// Display name of the application being stopped.
pub const TARGET_APP: &str = "AnyDesk";

/// Executable names the application shows up under, with and without extension.
pub const PROCESS_NAMES: [&str; 4] = ["AnyDesk.exe", "AnyDesk", "anydesk.exe", "anydesk"];

/// Data folder location relative to the user's home directory.
pub const DATA_DIR_SEGMENTS: [&str; 3] = ["AppData", "Roaming", "AnyDesk"];

/// Immutable set of executable names identifying the target application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessNameSet {
    names: BTreeSet<String>,
}

impl ProcessNameSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The names AnyDesk runs under on Windows and elsewhere.
    pub fn anydesk() -> Self {
        Self::new(PROCESS_NAMES)
    }

    /// A process name matches if it is in the set verbatim or once lower-cased.
    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim();
        self.names.contains(name) || self.names.contains(&name.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for ProcessNameSet {
    fn default() -> Self {
        Self::anydesk()
    }
}

/// The per-user data directory that gets purged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TargetDirectory(PathBuf);

impl TargetDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// `<home>/AppData/Roaming/AnyDesk`
    pub fn under_home(home: &Path) -> Self {
        Self(DATA_DIR_SEGMENTS.iter().fold(home.to_path_buf(), |p, s| p.join(s)))
    }

    /// Resolves the data directory for the current user.
    pub fn resolve() -> Result<Self> {
        dirs::home_dir()
            .map(|home| Self::under_home(&home))
            .ok_or(StopError::HomeDirUnavailable)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for TargetDirectory {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_known_spellings() {
        let names = ProcessNameSet::anydesk();
        assert!(names.matches("AnyDesk.exe"));
        assert!(names.matches("anydesk"));
        assert!(names.matches("ANYDESK.EXE"));
        assert!(names.matches("  AnyDesk  "));
    }

    #[test]
    fn test_rejects_other_processes() {
        let names = ProcessNameSet::anydesk();
        assert!(!names.matches("AnyDeskHelper.exe"));
        assert!(!names.matches("explorer.exe"));
        assert!(!names.matches(""));
    }

    #[test]
    fn test_lowercase_fallback_only_hits_lowercase_entries() {
        let names = ProcessNameSet::new(["Foo.exe"]);
        assert!(names.matches("Foo.exe"));
        assert!(!names.matches("foo.exe"));
        assert!(!names.matches("FOO.EXE"));
    }

    #[test]
    fn test_target_directory_under_home() {
        let target = TargetDirectory::under_home(Path::new("/home/alice"));
        assert_eq!(
            target.path(),
            Path::new("/home/alice").join("AppData").join("Roaming").join("AnyDesk")
        );
    }
}
