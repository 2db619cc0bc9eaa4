//! Local store capability.
//!
//! Every path handed to a [`LocalStore`] is relative to the store root
//! (the configured `base_path`). [`FsStore`] is the filesystem
//! implementation; writes use a `.docmirror.tmp` sibling + rename.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::error::{io_err, SyncError};

/// Suffix of the temporary sibling used by atomic writes.
pub const TMP_SUFFIX: &str = ".docmirror.tmp";

/// One child of a folder, as a store-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub path: PathBuf,
    pub is_folder: bool,
}

/// File-tree primitives the engine needs from the host.
pub trait LocalStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>, SyncError>;

    fn read_text(&self, path: &Path) -> Result<String, SyncError> {
        String::from_utf8(self.read(path)?).map_err(|_| SyncError::NotUtf8 {
            path: path.display().to_string(),
        })
    }

    /// Create or replace a file. The parent folder must exist.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), SyncError>;

    fn delete_file(&self, path: &Path) -> Result<(), SyncError>;

    /// Delete a folder. Fails unless it is empty.
    fn delete_folder(&self, path: &Path) -> Result<(), SyncError>;

    /// Create a single folder whose parent already exists.
    fn create_folder(&self, path: &Path) -> Result<(), SyncError>;

    fn exists(&self, path: &Path) -> bool;

    fn is_folder(&self, path: &Path) -> bool;

    /// Children of a folder, sorted by path.
    fn list_children(&self, path: &Path) -> Result<Vec<StoreEntry>, SyncError>;
}

/// Create every missing folder along `path`, outermost first.
///
/// Returns the folders that were created.
pub fn ensure_folders<S: LocalStore + ?Sized>(
    store: &S,
    path: &Path,
) -> Result<Vec<PathBuf>, SyncError> {
    let mut created = Vec::new();
    let mut current = PathBuf::new();
    for component in path.components() {
        current.push(component);
        if !store.is_folder(&current) {
            store.create_folder(&current)?;
            created.push(current.clone());
        }
    }
    Ok(created)
}

/// Whether `path` is a folder with no children.
pub fn is_empty_folder<S: LocalStore + ?Sized>(store: &S, path: &Path) -> Result<bool, SyncError> {
    Ok(store.is_folder(path) && store.list_children(path)?.is_empty())
}

/// Number of normal components in a store-relative path.
pub fn depth(path: &Path) -> usize {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count()
}

// ---------------------------------------------------------------------------
// FsStore
// ---------------------------------------------------------------------------

/// [`LocalStore`] over a directory on disk.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn abs(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl LocalStore for FsStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>, SyncError> {
        let abs = self.abs(path);
        std::fs::read(&abs).map_err(|e| io_err(abs, e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), SyncError> {
        let abs = self.abs(path);
        let tmp = PathBuf::from(format!("{}{TMP_SUFFIX}", abs.display()));
        std::fs::write(&tmp, contents).map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &abs) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(abs, e));
        }
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> Result<(), SyncError> {
        let abs = self.abs(path);
        std::fs::remove_file(&abs).map_err(|e| io_err(abs, e))
    }

    fn delete_folder(&self, path: &Path) -> Result<(), SyncError> {
        let abs = self.abs(path);
        std::fs::remove_dir(&abs).map_err(|e| io_err(abs, e))
    }

    fn create_folder(&self, path: &Path) -> Result<(), SyncError> {
        let abs = self.abs(path);
        match std::fs::create_dir(&abs) {
            Err(e) if e.kind() == ErrorKind::AlreadyExists && abs.is_dir() => Ok(()),
            other => other.map_err(|e| io_err(abs, e)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.abs(path).exists()
    }

    fn is_folder(&self, path: &Path) -> bool {
        self.abs(path).is_dir()
    }

    fn list_children(&self, path: &Path) -> Result<Vec<StoreEntry>, SyncError> {
        let abs = self.abs(path);
        let reader = std::fs::read_dir(&abs).map_err(|e| io_err(&abs, e))?;
        let mut entries = Vec::new();
        for entry in reader {
            let entry = entry.map_err(|e| io_err(&abs, e))?;
            let file_type = entry.file_type().map_err(|e| io_err(entry.path(), e))?;
            entries.push(StoreEntry {
                path: path.join(entry.file_name()),
                is_folder: file_type.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}
