//! Combined annotation pipeline and its inverse.
//!
//! The canonical layout is
//! `[header?] [banner?] [backlink?] original body`; each step detects its own
//! block before inserting it, so the pipeline can be re-applied to its own
//! output without duplicating anything.
//!
//! Inserted blocks always use LF. The body is never rewritten, so a CRLF
//! document keeps its line endings through `annotate` and `strip`.

use chrono::{DateTime, Utc};

use docmirror_core::{FileMetadata, Toggles};

use crate::backlink::{add_backlink, remove_leading_backlink};
use crate::banner::{add_banner, remove_banner};
use crate::header::{add_header, header_end, strip_provenance_header, without_timestamp};

/// Apply header → banner → backlink, each gated on its toggle.
///
/// `backlink_target` is computed by the caller; `None` skips the backlink.
pub fn annotate(
    body: &str,
    meta: &FileMetadata,
    backlink_target: Option<&str>,
    toggles: &Toggles,
    now: DateTime<Utc>,
) -> String {
    let mut out = body.to_string();
    if toggles.metadata_header {
        out = add_header(&out, meta, now);
    }
    if toggles.readonly_banner {
        out = add_banner(&out, meta);
    }
    if toggles.backlinks {
        if let Some(target) = backlink_target {
            out = add_backlink(&out, target);
        }
    }
    out
}

/// Inverse of [`annotate`].
///
/// Removes a leading header that carries the provenance key, the first banner
/// block, and a backlink line directly after whatever header remains; then
/// trims blank lines at that position.
pub fn strip(body: &str) -> String {
    let rest = strip_provenance_header(body);
    let rest = remove_banner(rest);

    let at = header_end(&rest).unwrap_or(0);
    let (kept, tail) = rest.split_at(at);
    let tail = remove_leading_backlink(tail).trim_start_matches('\n');

    let mut out = String::with_capacity(kept.len() + tail.len());
    out.push_str(kept);
    out.push_str(tail);
    out
}

/// Whether two documents are equal once the header's `synced_at` is ignored.
pub fn same_ignoring_timestamp(a: &str, b: &str) -> bool {
    without_timestamp(a) == without_timestamp(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use docmirror_core::{RepoOrigin, RepoRef};

    use crate::backlink::backlink_line;
    use crate::banner::BANNER_TITLE;

    fn meta() -> FileMetadata {
        FileMetadata::for_file(
            &RepoRef::new("octo", "docs", "main", RepoOrigin::Manual),
            "guide/intro.md",
        )
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
    }

    #[test]
    fn full_pipeline_layout_order() {
        let out = annotate("# Intro\n", &meta(), Some("GitHub/octo/docs/README"), &Toggles::default(), at(0));
        let header_pos = out.find("github_repo").unwrap();
        let banner_pos = out.find(BANNER_TITLE).unwrap();
        let link_pos = out.find(&backlink_line("GitHub/octo/docs/README")).unwrap();
        let body_pos = out.find("# Intro").unwrap();
        assert!(header_pos < banner_pos && banner_pos < link_pos && link_pos < body_pos);
    }

    #[test]
    fn toggles_gate_each_block() {
        let toggles = Toggles {
            metadata_header: false,
            readonly_banner: false,
            backlinks: true,
            ..Toggles::default()
        };
        let out = annotate("Body", &meta(), Some("GitHub"), &toggles, at(0));
        assert_eq!(out, "↑ [[GitHub]]\n\nBody");

        let out = annotate("Body", &meta(), None, &Toggles::default(), at(0));
        assert!(!out.contains("↑ [["));
    }

    #[test]
    fn crlf_body_is_kept_verbatim() {
        let body = "a\r\nb\r\n";
        let out = annotate(body, &meta(), Some("GitHub"), &Toggles::default(), at(0));
        assert!(out.ends_with("\n\na\r\nb\r\n"));
        assert_eq!(strip(&out), body);
    }

    #[test]
    fn crlf_foreign_front_matter_round_trips() {
        let body = "---\r\ntitle: Upstream\r\n---\r\n\r\nText\r\n";
        let out = annotate(body, &meta(), Some("GitHub"), &Toggles::default(), at(0));
        assert!(out.starts_with("---\r\ntitle: Upstream\r\n---\r\n\r\n> [!warning]"));
        assert_eq!(annotate(&out, &meta(), Some("GitHub"), &Toggles::default(), at(9)), out);
        assert_eq!(strip(&out), body);
    }

    #[test]
    fn strip_keeps_foreign_front_matter_and_removes_our_blocks() {
        let original = "---\ntitle: Upstream\n---\nText\n";
        let out = annotate(original, &meta(), Some("GitHub"), &Toggles::default(), at(0));
        assert!(out.starts_with("---\ntitle: Upstream\n---\n> [!warning]"));
        assert_eq!(strip(&out), original);
    }

    #[test]
    fn same_ignoring_timestamp_detects_real_changes() {
        let toggles = Toggles::default();
        let a = annotate("v1", &meta(), None, &toggles, at(0));
        let b = annotate("v1", &meta(), None, &toggles, at(500));
        let c = annotate("v2", &meta(), None, &toggles, at(0));
        assert!(same_ignoring_timestamp(&a, &b));
        assert!(!same_ignoring_timestamp(&a, &c));
    }
}
