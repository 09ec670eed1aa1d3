//! Data folder removal

use crate::target::TargetDirectory;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeResult {
    pub directory_existed: bool,
    pub deletion_succeeded: bool,
    pub error_message: Option<String>,
}

impl PurgeResult {
    fn missing() -> Self {
        Self {
            directory_existed: false,
            deletion_succeeded: false,
            error_message: None,
        }
    }

    fn deleted() -> Self {
        Self {
            directory_existed: true,
            deletion_succeeded: true,
            error_message: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            directory_existed: true,
            deletion_succeeded: false,
            error_message: Some(message),
        }
    }
}

/// Size of a directory tree, for previews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    pub total_bytes: u64,
    pub entry_count: usize,
}

/// Deletes the target directory tree.
///
/// Entries that refuse deletion with a permission error get their read-only
/// attribute cleared and are retried once. Entries that still fail are left in
/// place and the walk moves on; only a failure to remove the root itself is
/// reported back.
pub fn purge(target: &TargetDirectory) -> PurgeResult {
    let root = target.path();
    if !root.is_dir() {
        debug!(path = %root.display(), "data folder not present");
        return PurgeResult::missing();
    }

    let mut walk = TreeRemoval { root, skipped: 0 };
    match walk.remove_entry(root) {
        Ok(()) => {
            debug!(path = %root.display(), "data folder removed");
            PurgeResult::deleted()
        }
        Err(e) => {
            warn!(
                path = %root.display(),
                skipped = walk.skipped,
                error = %e,
                "data folder not fully removed"
            );
            PurgeResult::failed(e.to_string())
        }
    }
}

/// Counts files and total size under the target, or `None` if it does not exist.
pub fn measure(target: &TargetDirectory) -> Option<TreeStats> {
    let root = target.path();
    if !root.is_dir() {
        return None;
    }
    let mut stats = TreeStats::default();
    accumulate(root, &mut stats);
    Some(stats)
}

fn accumulate(dir: &Path, stats: &mut TreeStats) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        stats.entry_count += 1;
        let path = entry.path();
        let Ok(meta) = fs::symlink_metadata(&path) else {
            continue;
        };
        if meta.is_dir() {
            accumulate(&path, stats);
        } else {
            stats.total_bytes += meta.len();
        }
    }
}

struct TreeRemoval<'a> {
    #[cfg_attr(not(unix), allow(dead_code))]
    root: &'a Path,
    skipped: usize,
}

impl TreeRemoval<'_> {
    /// Removes `path` bottom-up. Symlinks are unlinked, never followed.
    fn remove_entry(&mut self, path: &Path) -> io::Result<()> {
        let file_type = fs::symlink_metadata(path)?.file_type();
        if !file_type.is_dir() {
            return self.with_readonly_retry(path, remove_file_or_link);
        }

        let entries = self.with_readonly_retry(path, |p| fs::read_dir(p))?;
        for entry in entries {
            let child = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!(dir = %path.display(), error = %e, "unreadable directory entry");
                    self.skipped += 1;
                    continue;
                }
            };
            if let Err(e) = self.remove_entry(&child) {
                warn!(path = %child.display(), error = %e, "leaving entry in place");
                self.skipped += 1;
            }
        }

        self.with_readonly_retry(path, |p| fs::remove_dir(p))
    }

    fn with_readonly_retry<T>(
        &self,
        path: &Path,
        op: impl Fn(&Path) -> io::Result<T>,
    ) -> io::Result<T> {
        match op(path) {
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                debug!(path = %path.display(), "permission denied, clearing read-only");
                if let Err(clear_err) = self.clear_readonly(path) {
                    debug!(path = %path.display(), error = %clear_err, "could not clear read-only");
                    return Err(e);
                }
                op(path)
            }
            other => other,
        }
    }

    fn clear_readonly(&self, path: &Path) -> io::Result<()> {
        self.unlock_parent(path);
        if fs::symlink_metadata(path)?.file_type().is_symlink() {
            return Ok(());
        }
        make_writable(path)
    }

    /// On Unix removing an entry needs write access to its directory.
    /// Only directories inside the purged tree are touched.
    #[cfg(unix)]
    fn unlock_parent(&self, path: &Path) {
        if let Some(parent) = path.parent().filter(|p| p.starts_with(self.root)) {
            if let Err(e) = make_writable(parent) {
                debug!(path = %parent.display(), error = %e, "could not make parent writable");
            }
        }
    }

    #[cfg(not(unix))]
    fn unlock_parent(&self, _path: &Path) {}
}

#[cfg(unix)]
fn make_writable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o700);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn make_writable(path: &Path) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    if perms.readonly() {
        perms.set_readonly(false);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}

#[cfg(not(windows))]
fn remove_file_or_link(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

/// Directory symlinks on Windows are removed like directories.
#[cfg(windows)]
fn remove_file_or_link(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if is_symlink(path) => fs::remove_dir(path).map_err(|_| e),
        other => other,
    }
}

#[cfg(windows)]
fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(path: &Path, content: &str) {
        let mut file = File::create(path).unwrap();
        write!(file, "{}", content).unwrap();
    }

    fn set_readonly(path: &Path) {
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(path, perms).unwrap();
    }

    #[test]
    fn test_missing_directory_is_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let target = TargetDirectory::new(temp_dir.path().join("AnyDesk"));

        let result = purge(&target);

        assert_eq!(result, PurgeResult::missing());
        assert!(!target.path().exists());
    }

    #[test]
    fn test_regular_file_is_not_a_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("AnyDesk");
        write_file(&file_path, "not a folder");

        let result = purge(&TargetDirectory::new(&file_path));

        assert!(!result.directory_existed);
        assert!(file_path.exists());
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("AnyDesk");
        fs::create_dir(&dir).unwrap();

        let result = purge(&TargetDirectory::new(&dir));

        assert_eq!(result, PurgeResult::deleted());
        assert!(!dir.exists());
    }

    #[test]
    fn test_read_only_file_is_removed() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("AnyDesk");
        fs::create_dir(&dir).unwrap();
        write_file(&dir.join("a.txt"), "normal");
        write_file(&dir.join("b.txt"), "read-only");
        set_readonly(&dir.join("b.txt"));

        let result = purge(&TargetDirectory::new(&dir));

        assert!(result.directory_existed);
        assert!(result.deletion_succeeded);
        assert_eq!(result.error_message, None);
        assert!(!dir.exists());
    }

    #[test]
    fn test_nested_tree() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("AnyDesk");
        fs::create_dir_all(dir.join("thumbnails").join("cache")).unwrap();
        write_file(&dir.join("service.conf"), "ad.anynet.id=123");
        write_file(&dir.join("thumbnails").join("cache").join("x.png"), "png");
        set_readonly(&dir.join("thumbnails").join("cache").join("x.png"));

        let result = purge(&TargetDirectory::new(&dir));

        assert!(result.deletion_succeeded);
        assert!(!dir.exists());
        assert!(temp_dir.path().exists());
    }

    #[test]
    fn test_second_purge_finds_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("AnyDesk");
        fs::create_dir(&dir).unwrap();
        write_file(&dir.join("user.conf"), "x");
        let target = TargetDirectory::new(&dir);

        let first = purge(&target);
        let second = purge(&target);

        assert!(first.directory_existed);
        assert!(first.deletion_succeeded);
        assert_eq!(second, PurgeResult::missing());
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_subdirectory_is_removed() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("AnyDesk");
        let locked = dir.join("locked");
        fs::create_dir_all(&locked).unwrap();
        write_file(&locked.join("system.conf"), "x");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        let result = purge(&TargetDirectory::new(&dir));

        assert!(result.deletion_succeeded, "{:?}", result.error_message);
        assert!(!dir.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_contents_are_not_followed() {
        let temp_dir = TempDir::new().unwrap();
        let outside = temp_dir.path().join("outside");
        fs::create_dir(&outside).unwrap();
        write_file(&outside.join("keep.txt"), "keep");

        let dir = temp_dir.path().join("AnyDesk");
        fs::create_dir(&dir).unwrap();
        std::os::unix::fs::symlink(&outside, dir.join("link")).unwrap();

        let result = purge(&TargetDirectory::new(&dir));

        assert!(result.deletion_succeeded);
        assert!(!dir.exists());
        assert!(outside.join("keep.txt").exists());
    }

    fn denied() -> io::Error {
        io::Error::from(io::ErrorKind::PermissionDenied)
    }

    #[test]
    fn test_retry_once_after_permission_denied() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("locked.conf");
        write_file(&file_path, "x");
        set_readonly(&file_path);
        let walk = TreeRemoval {
            root: temp_dir.path(),
            skipped: 0,
        };
        let calls = Cell::new(0);

        let result = walk.with_readonly_retry(&file_path, |_| {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                Err(denied())
            } else {
                Ok(())
            }
        });

        assert!(result.is_ok());
        assert_eq!(calls.get(), 2);
        assert!(!fs::metadata(&file_path).unwrap().permissions().readonly());
    }

    #[test]
    fn test_retry_gives_up_after_second_failure() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("locked.conf");
        write_file(&file_path, "x");
        let walk = TreeRemoval {
            root: temp_dir.path(),
            skipped: 0,
        };
        let calls = Cell::new(0);

        let result: io::Result<()> = walk.with_readonly_retry(&file_path, |_| {
            calls.set(calls.get() + 1);
            Err(denied())
        });

        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_other_errors_are_not_retried() {
        let temp_dir = TempDir::new().unwrap();
        let walk = TreeRemoval {
            root: temp_dir.path(),
            skipped: 0,
        };
        let calls = Cell::new(0);

        let result: io::Result<()> = walk.with_readonly_retry(temp_dir.path(), |_| {
            calls.set(calls.get() + 1);
            Err(io::Error::from(io::ErrorKind::NotFound))
        });

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_locked_root_reports_error_and_removes_contents() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let parent = temp_dir.path().join("Roaming");
        let dir = parent.join("AnyDesk");
        fs::create_dir_all(dir.join("sub")).unwrap();
        write_file(&dir.join("a.txt"), "normal");
        write_file(&dir.join("sub").join("b.txt"), "nested");
        fs::set_permissions(&parent, fs::Permissions::from_mode(0o555)).unwrap();

        // privileged users ignore directory modes
        if File::create(parent.join("write-check")).is_ok() {
            fs::set_permissions(&parent, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = purge(&TargetDirectory::new(&dir));
        fs::set_permissions(&parent, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(result.directory_existed);
        assert!(!result.deletion_succeeded);
        assert!(result.error_message.is_some());
        assert!(dir.exists());
        assert!(!dir.join("a.txt").exists());
        assert!(!dir.join("sub").exists());
    }

    #[test]
    fn test_measure() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("AnyDesk");
        fs::create_dir_all(dir.join("sub")).unwrap();
        write_file(&dir.join("a.txt"), "12345");
        write_file(&dir.join("sub").join("b.txt"), "123");

        let stats = measure(&TargetDirectory::new(&dir)).unwrap();

        assert_eq!(stats.total_bytes, 8);
        assert_eq!(stats.entry_count, 3);
        assert!(measure(&TargetDirectory::new(temp_dir.path().join("missing"))).is_none());
    }
}
