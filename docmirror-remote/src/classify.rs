//! Which remote files are worth mirroring.

use docmirror_core::{EntryKind, TreeEntry};

pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "mdx"];

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "ico", "avif",
];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv"];
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "flac"];
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];

/// How a syncable file is fetched and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Text, run through the annotation pipeline.
    Markdown,
    /// Binary, copied verbatim.
    Media,
}

/// A remote blob selected for mirroring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncableFile {
    pub entry: TreeEntry,
    pub kind: FileKind,
}

impl SyncableFile {
    pub fn path(&self) -> &str {
        &self.entry.path
    }

    pub fn is_markdown(&self) -> bool {
        self.kind == FileKind::Markdown
    }
}

/// Lower-cased extension of the last path segment, if any.
pub fn extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

pub fn is_markdown_path(path: &str) -> bool {
    extension(path).is_some_and(|ext| MARKDOWN_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_media_path(path: &str) -> bool {
    let Some(ext) = extension(path) else {
        return false;
    };
    [
        IMAGE_EXTENSIONS,
        VIDEO_EXTENSIONS,
        AUDIO_EXTENSIONS,
        DOCUMENT_EXTENSIONS,
    ]
    .iter()
    .any(|group| group.contains(&ext.as_str()))
}

/// Classify one tree entry. Non-blobs and unlisted extensions yield `None`.
pub fn classify(entry: &TreeEntry, include_media: bool) -> Option<FileKind> {
    if entry.kind != EntryKind::Blob {
        return None;
    }
    if is_markdown_path(&entry.path) {
        Some(FileKind::Markdown)
    } else if include_media && is_media_path(&entry.path) {
        Some(FileKind::Media)
    } else {
        None
    }
}

/// Keep the entries worth mirroring, in tree order.
pub fn select_syncable(entries: Vec<TreeEntry>, include_media: bool) -> Vec<SyncableFile> {
    entries
        .into_iter()
        .filter_map(|entry| {
            classify(&entry, include_media).map(|kind| SyncableFile { entry, kind })
        })
        .collect()
}
