//! Run lock: at most one sync run per home directory.
//!
//! The lock is a JSON file created with create-new semantics at
//! `~/.docmirror/run.lock`. A lock older than [`STALE_AFTER_SECS`] is assumed to
//! belong to a crashed run and is replaced.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use docmirror_core::config::docmirror_root;

use crate::error::{io_err, SyncError};

pub const LOCK_FILE: &str = "run.lock";

/// Age in seconds after which a held lock is considered abandoned.
pub const STALE_AFTER_SECS: i64 = 60 * 60;

fn stale_after() -> Duration {
    Duration::seconds(STALE_AFTER_SECS)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}

/// Held run lock; released on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

pub fn lock_path_at(home: &Path) -> PathBuf {
    docmirror_root(home).join(LOCK_FILE)
}

fn try_create(path: &Path, info: &LockInfo) -> Result<bool, SyncError> {
    let json = serde_json::to_vec(info)?;
    try_create_with(path, |file| file.write_all(&json))
}

/// Create the lock file and fill it with `write`. A file left empty or
/// partial by a failed write is removed again.
fn try_create_with<F>(path: &Path, write: F) -> Result<bool, SyncError>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(io_err(path, e)),
    };
    if let Err(e) = write(&mut file) {
        drop(file);
        if let Err(cleanup) = std::fs::remove_file(path) {
            tracing::warn!("cannot remove partial run lock {}: {cleanup}", path.display());
        }
        return Err(io_err(path, e));
    }
    Ok(true)
}

/// Replace the stale lock whose bytes were `seen`.
///
/// The old file is first renamed to a private name. Only one contender can
/// win that rename; if its content is no longer `seen`, another run already
/// replaced the lock and it is put back untouched.
fn replace_stale(path: &Path, seen: &[u8], info: &LockInfo) -> Result<bool, SyncError> {
    let claimed = path.with_extension(format!("lock.stale.{}", std::process::id()));
    match std::fs::rename(path, &claimed) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => return try_create(path, info),
        Err(e) => return Err(io_err(path, e)),
    }

    let current = std::fs::read(&claimed).map_err(|e| io_err(&claimed, e))?;
    if current != seen {
        match std::fs::hard_link(&claimed, path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::warn!("run lock {} changed hands during replacement", path.display());
            }
            Err(e) => return Err(io_err(path, e)),
        }
        std::fs::remove_file(&claimed).map_err(|e| io_err(&claimed, e))?;
        return Ok(false);
    }

    std::fs::remove_file(&claimed).map_err(|e| io_err(&claimed, e))?;
    try_create(path, info)
}

/// Current holder of the lock, if the file exists and parses.
pub fn read_lock_at(home: &Path) -> Option<LockInfo> {
    let contents = std::fs::read(lock_path_at(home)).ok()?;
    serde_json::from_slice(&contents).ok()
}

impl RunLock {
    /// Acquire the lock at `now`, replacing a stale one.
    pub fn acquire_at(home: &Path, now: DateTime<Utc>) -> Result<Self, SyncError> {
        let dir = docmirror_root(home);
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        let path = lock_path_at(home);
        let info = LockInfo {
            pid: std::process::id(),
            started_at: now,
        };

        if try_create(&path, &info)? {
            return Ok(Self { path });
        }

        let seen = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return if try_create(&path, &info)? {
                    Ok(Self { path })
                } else {
                    Err(SyncError::RunInProgress { path })
                };
            }
            Err(e) => return Err(io_err(&path, e)),
        };
        let stale = match serde_json::from_slice::<LockInfo>(&seen) {
            Ok(held) => now.signed_duration_since(held.started_at) > stale_after(),
            // Unreadable or half-written lock: only stale once old enough on disk.
            Err(_) => lock_file_age(&path).is_some_and(|age| age > stale_after()),
        };
        if !stale {
            return Err(SyncError::RunInProgress { path });
        }

        tracing::warn!("replacing stale run lock at {}", path.display());
        if replace_stale(&path, &seen, &info)? {
            Ok(Self { path })
        } else {
            Err(SyncError::RunInProgress { path })
        }
    }

    pub fn acquire(home: &Path) -> Result<Self, SyncError> {
        Self::acquire_at(home, Utc::now())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn lock_file_age(path: &Path) -> Option<Duration> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let modified: DateTime<Utc> = modified.into();
    Some(Utc::now().signed_duration_since(modified))
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!("failed to release run lock {}: {e}", self.path.display());
            }
        }
    }
}
