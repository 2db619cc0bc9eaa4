mod common;

use std::fs;
use std::time::{Duration, SystemTime};

use common::Scenario;
use docmirror_sync::{RunOptions, WriteResult};
use filetime::{set_file_mtime, FileTime};

fn docs_scenario() -> Scenario {
    let mut s = Scenario::new();
    s.manual("octo/docs");
    s.remote.put("octo/docs", "README.md", "# Docs\n");
    s.remote.put("octo/docs", "guides/setup.md", "Run it.\n");
    s.remote.put("octo/docs", "guides/deploy/prod.md", "Ship it.\n");
    s
}

#[test]
fn second_run_writes_nothing_and_keeps_mtimes() {
    let s = docs_scenario();
    let first = s.run();
    assert_eq!(first.written(), 3);

    let target = s.path("GitHub/octo/docs/guides/setup.md");
    let old = FileTime::from_system_time(SystemTime::now() - Duration::from_secs(24 * 60 * 60));
    set_file_mtime(&target, old).expect("set old mtime");
    let before = fs::read_to_string(&target).unwrap();

    let second = s.run();
    assert_eq!(second.written(), 0);
    assert_eq!(second.unchanged(), 3);
    assert!(second.repos[0]
        .sync
        .writes
        .iter()
        .all(|w| matches!(w, WriteResult::Unchanged { .. })));

    let mtime = FileTime::from_last_modification_time(&fs::metadata(&target).unwrap());
    assert_eq!(mtime, old, "unchanged file was rewritten");
    assert_eq!(fs::read_to_string(&target).unwrap(), before);
}

#[test]
fn mirrored_layout_and_backlinks() {
    let s = docs_scenario();
    s.run();

    assert!(s.read("GitHub/octo/docs/README.md").contains("↑ [[GitHub]]"));
    assert!(s
        .read("GitHub/octo/docs/guides/setup.md")
        .contains("↑ [[GitHub/octo/docs/README]]"));
    assert!(s
        .read("GitHub/octo/docs/guides/deploy/prod.md")
        .contains("↑ [[GitHub/octo/docs/guides/README]]"));
}

#[test]
fn local_edit_is_overwritten_on_next_run() {
    let s = docs_scenario();
    s.run();
    let path = s.path("GitHub/octo/docs/README.md");
    fs::write(&path, "scribbled over\n").unwrap();

    let summary = s.run();
    assert_eq!(summary.written(), 1);
    assert!(s.read("GitHub/octo/docs/README.md").ends_with("# Docs\n"));
}

#[test]
fn dry_run_leaves_vault_untouched() {
    let s = docs_scenario();
    let summary = s.run_with(RunOptions { dry_run: true });
    assert_eq!(summary.written(), 3);
    assert!(summary.dry_run);
    assert!(!s.exists("GitHub"));
}

#[test]
fn media_is_mirrored_only_when_enabled() {
    let mut s = docs_scenario();
    s.remote.put_bytes("octo/docs", "img/arch.png", b"\x89PNG");
    s.run();
    assert!(!s.exists("GitHub/octo/docs/img/arch.png"));

    s.config.toggles.sync_media = true;
    s.run();
    assert_eq!(
        fs::read(s.path("GitHub/octo/docs/img/arch.png")).unwrap(),
        b"\x89PNG"
    );

    let again = s.run();
    assert_eq!(again.written(), 0);

    s.remote.put_bytes("octo/docs", "img/arch.png", b"\x89PNG v2");
    let changed = s.run();
    assert_eq!(changed.written(), 1);
    assert_eq!(
        fs::read(s.path("GitHub/octo/docs/img/arch.png")).unwrap(),
        b"\x89PNG v2"
    );
}
