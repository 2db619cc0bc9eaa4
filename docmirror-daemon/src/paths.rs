use std::path::{Path, PathBuf};

use docmirror_core::config::docmirror_root;

pub const DAEMON_SOCKET: &str = "daemon.sock";

/// Bound of the sync request queue shared by the timer and socket clients.
pub const SYNC_QUEUE_CAPACITY: usize = 8;

pub fn socket_path(home: &Path) -> PathBuf {
    docmirror_root(home).join(DAEMON_SOCKET)
}
