use chrono::{DateTime, TimeZone, Utc};
use docmirror_annotate::{annotate, banner::BANNER_TITLE, extract_metadata, strip};
use docmirror_core::{FileMetadata, RepoOrigin, RepoRef, Toggles};
use rstest::rstest;

fn meta() -> FileMetadata {
    FileMetadata::for_file(
        &RepoRef::new("octo", "handbook", "main", RepoOrigin::Auto),
        "teams/platform/oncall.md",
    )
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("valid date")
}

fn all_on() -> Toggles {
    Toggles::default()
}

fn only(header: bool, banner: bool, backlinks: bool) -> Toggles {
    Toggles {
        metadata_header: header,
        readonly_banner: banner,
        backlinks,
        ..Toggles::default()
    }
}

const TARGET: Option<&str> = Some("GitHub/octo/handbook/teams/README");

#[rstest]
#[case::plain("# On-call\n\nPage the primary.\n")]
#[case::empty("")]
#[case::foreign_front_matter("---\ntitle: On-call\ntags: [ops]\n---\n\nBody\n")]
#[case::leading_blank_lines("\n\n\nBody after blanks\n")]
#[case::mentions_banner_inline("Quote `> [!warning] Read-only mirror` inline.\n")]
#[case::no_trailing_newline("last line")]
#[case::crlf("# Title\r\n\r\nLine\r\n")]
fn annotate_is_idempotent(#[case] body: &str) {
    let once = annotate(body, &meta(), TARGET, &all_on(), now());
    let twice = annotate(&once, &meta(), TARGET, &all_on(), now());
    assert_eq!(once, twice);
}

#[rstest]
#[case::plain("# On-call\n\nPage the primary.\n")]
#[case::empty("")]
#[case::foreign_front_matter("---\ntitle: On-call\n---\nBody\n")]
#[case::no_trailing_newline("last line")]
#[case::crlf("# Title\r\n\r\nLine\r\n")]
#[case::crlf_front_matter("---\r\ntitle: On-call\r\n---\r\n\r\nBody\r\n")]
#[case::mixed_endings("first\r\nsecond\nthird\r\n")]
fn strip_inverts_annotate(#[case] body: &str) {
    for toggles in [
        all_on(),
        only(true, false, false),
        only(false, true, false),
        only(false, false, true),
        only(true, true, false),
        only(false, true, true),
    ] {
        let annotated = annotate(body, &meta(), TARGET, &toggles, now());
        assert_eq!(strip(&annotated), body, "toggles: {toggles:?}");
    }
}

#[test]
fn annotated_file_carries_recoverable_provenance() {
    let annotated = annotate("Body\n", &meta(), TARGET, &all_on(), now());
    assert_eq!(extract_metadata(&annotated), Some(meta()));
}

#[test]
fn banner_appears_exactly_once_after_repeated_runs() {
    let mut doc = "Body\n".to_string();
    for _ in 0..3 {
        doc = annotate(&doc, &meta(), TARGET, &all_on(), now());
    }
    assert_eq!(doc.matches(BANNER_TITLE).count(), 1);
    assert_eq!(doc.matches("↑ [[").count(), 1);
    assert_eq!(doc.matches("github_repo:").count(), 1);
}

#[test]
fn strip_on_unannotated_text_is_identity() {
    let body = "# Notes\n\nNothing to see.\n";
    assert_eq!(strip(body), body);
}
