//! Hierarchical backlink line (`↑ [[target]]`).

use crate::banner::banner_len;
use crate::header::header_end;

pub const BACKLINK_PREFIX: &str = "↑ [[";
pub const BACKLINK_SUFFIX: &str = "]]";

pub fn backlink_line(target: &str) -> String {
    format!("{BACKLINK_PREFIX}{target}{BACKLINK_SUFFIX}")
}

pub fn is_backlink_line(line: &str) -> bool {
    let line = line.trim();
    line.starts_with(BACKLINK_PREFIX) && line.ends_with(BACKLINK_SUFFIX)
}

/// Offset after the header and a banner sitting directly below it.
pub(crate) fn insertion_point(body: &str) -> usize {
    let mut at = header_end(body).unwrap_or(0);
    if let Some(len) = banner_len(&body[at..]) {
        at += len;
    }
    at
}

/// Insert the backlink after header and banner unless one is already there.
pub fn add_backlink(body: &str, target: &str) -> String {
    let at = insertion_point(body);
    let first_line = body[at..].lines().next().unwrap_or("");
    if is_backlink_line(first_line) {
        return body.to_string();
    }
    let line = backlink_line(target);
    let mut out = String::with_capacity(body.len() + line.len() + 2);
    out.push_str(&body[..at]);
    out.push_str(&line);
    out.push_str("\n\n");
    out.push_str(&body[at..]);
    out
}

/// Drop a backlink line (and one following blank line) at the start of `s`.
pub(crate) fn remove_leading_backlink(s: &str) -> &str {
    let Some(first) = s.split_inclusive('\n').next() else {
        return s;
    };
    if !is_backlink_line(first) {
        return s;
    }
    let rest = &s[first.len()..];
    rest.strip_prefix('\n').unwrap_or(rest)
}
