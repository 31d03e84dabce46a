use crate::fs::FileSystem;
use crate::naming::{self, HandoverName, LEGACY_NAME};
use chrono::{DateTime, Local};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// A handover file found in the store directory.
#[derive(Debug, Clone)]
struct Entry {
    path: PathBuf,
    name: HandoverName,
    modified: SystemTime,
}

/// The handover documents in one working directory.
///
/// Every lookup is soft-fail: an unreadable or missing directory simply has
/// no handovers in it.
pub struct HandoverStore<'a, F: FileSystem> {
    fs: &'a F,
    dir: PathBuf,
}

impl<'a, F: FileSystem> HandoverStore<'a, F> {
    pub fn new(fs: &'a F, dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ---------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------

    /// Session-scoped handovers (archived and live), newest first.
    ///
    /// Ties on mtime are broken by path, descending, so a run always picks
    /// the same file.
    fn entries(&self) -> Vec<Entry> {
        let paths = match self.fs.list(&self.dir) {
            Ok(paths) => paths,
            Err(e) => {
                debug!(dir = %self.dir.display(), error = %e, "cannot list handover directory");
                return Vec::new();
            }
        };
        let mut entries: Vec<Entry> = paths
            .into_iter()
            .filter_map(|path| {
                let name = HandoverName::parse(path.file_name()?.to_str()?)?;
                if name == HandoverName::Legacy {
                    return None;
                }
                // Vanished between list and stat: skip it.
                let modified = self.fs.modified(&path).ok()?;
                Some(Entry {
                    path,
                    name,
                    modified,
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.path.cmp(&a.path))
        });
        entries
    }

    /// The most recently modified handover, scoped to `session` when given.
    ///
    /// Falls back to the unscoped `HANDOVER.md` when nothing matches.
    pub fn latest(&self, session: Option<&str>) -> Option<PathBuf> {
        let found = self
            .entries()
            .into_iter()
            .find(|e| session.is_none_or(|s| e.name.session() == Some(s)));
        if let Some(entry) = found {
            return Some(entry.path);
        }
        let legacy = self.dir.join(LEGACY_NAME);
        self.fs.is_file(&legacy).then_some(legacy)
    }

    /// Up to `count` handovers from any session, newest first.
    pub fn recent(&self, count: usize) -> Vec<PathBuf> {
        self.entries()
            .into_iter()
            .take(count)
            .map(|e| e.path)
            .collect()
    }

    // ---------------------------------------------------------------
    // Content
    // ---------------------------------------------------------------

    /// Full text of a handover, or `None` if it can't be read or is blank.
    pub fn read_content(&self, path: &Path) -> Option<String> {
        match self.fs.read(path) {
            Ok(content) if !content.trim().is_empty() => Some(content),
            Ok(_) => {
                debug!(path = %path.display(), "handover is empty");
                None
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "cannot read handover");
                None
            }
        }
    }

    // ---------------------------------------------------------------
    // Rotation
    // ---------------------------------------------------------------

    /// Rename a live handover to its archived name, stamped with the file's
    /// own mtime.
    ///
    /// Best-effort: returns the new path, or `None` if `path` is not a live
    /// handover, the target already exists, or the rename fails.
    pub fn archive(&self, path: &Path) -> Option<PathBuf> {
        let name = HandoverName::parse(path.file_name()?.to_str()?)?;
        let HandoverName::Live { session } = name else {
            return None;
        };
        let modified = match self.fs.modified(path) {
            Ok(m) => m,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "cannot stat live handover");
                return None;
            }
        };
        let parent = path.parent().unwrap_or(&self.dir);
        let target = parent
            .join(HandoverName::archived(&session, naming::local_time(modified)).file_name());
        if self.fs.is_file(&target) {
            warn!(target = %target.display(), "archive target already exists, leaving live handover in place");
            return None;
        }
        match self.fs.rename(path, &target) {
            Ok(()) => {
                debug!(from = %path.display(), to = %target.display(), "archived live handover");
                Some(target)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to archive handover");
                None
            }
        }
    }

    /// Archive the live handover for `session`, if there is one.
    pub fn rotate_live(&self, session: &str) -> Option<PathBuf> {
        let live = self.dir.join(HandoverName::live(session).file_name());
        if !self.fs.is_file(&live) {
            return None;
        }
        self.archive(&live)
    }

    // ---------------------------------------------------------------
    // Writing
    // ---------------------------------------------------------------

    /// Where a handover for `session` captured at `at` lives.
    pub fn archived_path(&self, session: &str, at: DateTime<Local>) -> PathBuf {
        self.dir.join(HandoverName::archived(session, at).file_name())
    }

    /// Write a new archived-format handover stamped `now`, then rotate any
    /// leftover live file for the same session.
    pub fn write_new(
        &self,
        session: &str,
        now: DateTime<Local>,
        content: &str,
    ) -> io::Result<PathBuf> {
        let path = self.archived_path(session, now);
        self.fs.write(&path, content)?;
        self.rotate_live(session);
        Ok(path)
    }
}

#[cfg(test)]
mod tests;
