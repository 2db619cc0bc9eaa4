//! Read-only banner: a callout warning that the file is a mirror.
//!
//! The block is three quoted lines followed by a blank line and always sits
//! directly after the header (or at the start when there is no header).

use docmirror_core::FileMetadata;

use crate::header::header_end;

pub const BANNER_TITLE: &str = "> [!warning] Read-only mirror";
pub const BANNER_EXPLANATION: &str =
    "> This file is mirrored from a remote repository; local edits are overwritten on the next sync.";
pub const BANNER_SOURCE_PREFIX: &str = "> Source: ";

/// The full banner block for `meta`, including the trailing blank line.
pub fn banner_block(meta: &FileMetadata) -> String {
    format!(
        "{BANNER_TITLE}\n{BANNER_EXPLANATION}\n{BANNER_SOURCE_PREFIX}[{}]({})\n\n",
        meta.repo_id(),
        meta.remote_url
    )
}

/// Insert the banner after the header. No-op if the banner title already
/// appears anywhere from the insertion point on.
pub fn add_banner(body: &str, meta: &FileMetadata) -> String {
    let at = header_end(body).unwrap_or(0);
    if body[at..].contains(BANNER_TITLE) {
        return body.to_string();
    }
    let block = banner_block(meta);
    let mut out = String::with_capacity(body.len() + block.len());
    out.push_str(&body[..at]);
    out.push_str(&block);
    out.push_str(&body[at..]);
    out
}

/// Length of the banner block at the start of `s`, or `None` if `s` does not
/// start with the banner title line.
pub(crate) fn banner_len(s: &str) -> Option<usize> {
    let mut lines = s.split_inclusive('\n');
    let title = lines.next()?;
    if title.trim_end() != BANNER_TITLE {
        return None;
    }
    let mut len = title.len();
    for _ in 0..2 {
        match lines.next() {
            Some(line) if line.starts_with('>') => len += line.len(),
            Some(line) if line == "\n" => return Some(len + 1),
            _ => return Some(len),
        }
    }
    if s[len..].starts_with('\n') {
        len += 1;
    }
    Some(len)
}

/// Remove the first banner block found at a line start, together with the
/// blank line that follows it.
pub fn remove_banner(body: &str) -> String {
    for (idx, _) in body.match_indices(BANNER_TITLE) {
        if idx != 0 && !body[..idx].ends_with('\n') {
            continue;
        }
        if let Some(len) = banner_len(&body[idx..]) {
            let mut out = String::with_capacity(body.len());
            out.push_str(&body[..idx]);
            out.push_str(&body[idx + len..]);
            return out;
        }
    }
    body.to_string()
}
