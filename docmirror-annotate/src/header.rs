//! Metadata header, a front-matter block carrying file provenance.
//!
//! # Layout
//!
//! ```text
//! ---
//! github_repo: "owner/repo"
//! github_branch: "main"
//! github_path: "docs/guide.md"
//! github_url: "https://github.com/owner/repo/blob/main/docs/guide.md"
//! synced_at: "2026-10-16T09:30:00Z"
//! readonly: true
//! ---
//!
//! ```
//!
//! A document "has a header" when it starts with a `---` line that is closed
//! by a second `---` line. Values are written as double-quoted JSON strings
//! so paths containing `:` or `#` survive; bare values are accepted on read.

use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use docmirror_core::types::{RepoId, DEFAULT_BRANCH};
use docmirror_core::FileMetadata;

pub const DELIMITER: &str = "---";

/// Key whose presence marks a header as written by docmirror.
pub const PROVENANCE_KEY: &str = "github_repo";
pub const KEY_BRANCH: &str = "github_branch";
pub const KEY_PATH: &str = "github_path";
pub const KEY_URL: &str = "github_url";
pub const KEY_SYNCED_AT: &str = "synced_at";
pub const KEY_READONLY: &str = "readonly";

/// Byte offsets of a leading header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeaderSpan {
    /// Start of the first field line (just past the opening delimiter).
    pub inner_start: usize,
    /// Start of the closing delimiter line.
    pub inner_end: usize,
    /// Just past the closing delimiter line.
    pub block_end: usize,
}

pub(crate) fn header_span(body: &str) -> Option<HeaderSpan> {
    let first = body.split_inclusive('\n').next()?;
    if first.trim_end() != DELIMITER || !first.ends_with('\n') {
        return None;
    }
    let inner_start = first.len();
    let mut offset = inner_start;
    for line in body[inner_start..].split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            return Some(HeaderSpan {
                inner_start,
                inner_end: offset,
                block_end: offset + line.len(),
            });
        }
        offset += line.len();
    }
    None
}

/// Offset just past the header block and the blank line that follows it.
///
/// `None` when the document does not start with a closed header block.
pub fn header_end(body: &str) -> Option<usize> {
    let span = header_span(body)?;
    let after = &body[span.block_end..];
    let blank = if after.starts_with('\n') {
        1
    } else if after.starts_with("\r\n") {
        2
    } else {
        0
    };
    Some(span.block_end + blank)
}

/// Whether the document starts with a closed header block.
pub fn has_header(body: &str) -> bool {
    header_span(body).is_some()
}

/// Parsed `key: value` pairs of the leading header, in document order.
pub fn header_fields(body: &str) -> Option<Vec<(String, String)>> {
    let span = header_span(body)?;
    let inner = &body[span.inner_start..span.inner_end];
    let fields = inner
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            if key.is_empty() || key.starts_with('#') {
                return None;
            }
            Some((key.to_string(), unquote(value.trim())))
        })
        .collect();
    Some(fields)
}

/// Prepend a provenance header unless the document already has one.
pub fn add_header(body: &str, meta: &FileMetadata, now: DateTime<Utc>) -> String {
    if has_header(body) {
        return body.to_string();
    }
    let repo_id = meta.repo_id();
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut out = String::with_capacity(body.len() + 256);
    out.push_str(DELIMITER);
    out.push('\n');
    push_field(&mut out, PROVENANCE_KEY, &quote(&repo_id.0));
    push_field(&mut out, KEY_BRANCH, &quote(&meta.branch));
    push_field(&mut out, KEY_PATH, &quote(&meta.path));
    push_field(&mut out, KEY_URL, &quote(&meta.remote_url));
    push_field(&mut out, KEY_SYNCED_AT, &quote(&timestamp));
    push_field(&mut out, KEY_READONLY, "true");
    out.push_str(DELIMITER);
    out.push_str("\n\n");
    out.push_str(body);
    out
}

/// Recover provenance from a leading header.
///
/// Returns `None` if there is no header or any of `github_repo`,
/// `github_path`, `github_url` is missing; such a file is not ours.
pub fn extract_metadata(body: &str) -> Option<FileMetadata> {
    let fields = header_fields(body)?;
    let get = |key: &str| {
        fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .filter(|v| !v.is_empty())
    };

    let repo_id = RepoId::from(get(PROVENANCE_KEY)?);
    let (owner, repo) = repo_id.split()?;
    let path = get(KEY_PATH)?;
    let remote_url = get(KEY_URL)?;
    let branch = get(KEY_BRANCH)
        .or_else(|| branch_from_url(&remote_url))
        .unwrap_or_else(|| DEFAULT_BRANCH.to_string());

    Some(FileMetadata {
        owner: owner.to_string(),
        repo: repo.to_string(),
        branch,
        path,
        remote_url,
    })
}

/// Remove the leading header only if it carries the provenance key.
pub fn strip_provenance_header(body: &str) -> &str {
    let owned = header_fields(body)
        .map(|fields| fields.iter().any(|(k, _)| k == PROVENANCE_KEY))
        .unwrap_or(false);
    match header_end(body) {
        Some(end) if owned => &body[end..],
        _ => body,
    }
}

/// The document with the header's `synced_at` line removed.
pub(crate) fn without_timestamp(body: &str) -> Cow<'_, str> {
    let Some(span) = header_span(body) else {
        return Cow::Borrowed(body);
    };
    let inner = &body[span.inner_start..span.inner_end];
    if !inner
        .lines()
        .any(|line| field_key(line) == Some(KEY_SYNCED_AT))
    {
        return Cow::Borrowed(body);
    }
    let mut out = String::with_capacity(body.len());
    out.push_str(&body[..span.inner_start]);
    for line in inner.split_inclusive('\n') {
        if field_key(line) != Some(KEY_SYNCED_AT) {
            out.push_str(line);
        }
    }
    out.push_str(&body[span.inner_end..]);
    Cow::Owned(out)
}

fn field_key(line: &str) -> Option<&str> {
    line.split_once(':').map(|(k, _)| k.trim())
}

fn push_field(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}

fn quote(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

fn unquote(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        if let Ok(value) = serde_json::from_str::<String>(raw) {
            return value;
        }
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].replace("''", "'");
    }
    raw.to_string()
}

fn branch_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/blob/")?;
    rest.split('/')
        .next()
        .filter(|b| !b.is_empty())
        .map(str::to_string)
}
