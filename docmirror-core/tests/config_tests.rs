//! Config error-message, atomic-write-safety, and init integration tests.
//! Storage: ~/.docmirror/config.yaml and ~/.docmirror/state.json

use assert_fs::prelude::*;
use docmirror_core::{config, state, ConfigError, ManualRepo, MirrorConfig};
use predicates::prelude::predicate;
use std::fs;
use std::path::PathBuf;

fn sample() -> MirrorConfig {
    let mut cfg = MirrorConfig::new(PathBuf::from("/vault"));
    cfg.token = Some("ghp_sample".to_string());
    cfg.namespaces = vec!["octo".to_string()];
    cfg.repositories = vec![ManualRepo {
        repo: "octo/docs".to_string(),
        branch: Some("main".to_string()),
    }];
    cfg
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_mentions_init() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ConfigNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"));
    assert!(err.to_string().contains("docmirror init"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".docmirror/config.yaml")
        .write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"));
}

#[test]
fn load_without_base_path_is_a_parse_error() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".docmirror/config.yaml")
        .write_str("namespaces: [octo]\n")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Atomic write safety
// ---------------------------------------------------------------------------

#[test]
fn save_cleans_up_tmp_file() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::save_at(home.path(), &sample()).expect("save");
    home.child(".docmirror/config.yaml.tmp")
        .assert(predicate::path::missing());
    home.child(".docmirror/config.yaml")
        .assert(predicate::path::exists());
}

#[test]
fn mid_write_crash_leaves_original_intact() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::save_at(home.path(), &sample()).expect("save");

    let path = config::config_path_at(home.path());
    let original = fs::read(&path).expect("read original");

    // Simulate crash: .tmp written but process died before rename
    let tmp = path.with_file_name("config.yaml.tmp");
    fs::write(&tmp, b"CRASH - INCOMPLETE WRITE").expect("write crash tmp");

    assert_eq!(original, fs::read(&path).expect("read after crash"));
    let loaded = config::load_at(home.path()).expect("load after crash");
    assert_eq!(loaded, sample());
}

// ---------------------------------------------------------------------------
// 3. Init and state
// ---------------------------------------------------------------------------

#[test]
fn init_writes_config_with_restrictive_mode() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::init_at(home.path(), sample()).expect("init");

    let path = config::config_path_at(home.path());
    let contents = fs::read_to_string(&path).expect("read");
    assert!(contents.contains("octo/docs"));
    assert!(contents.contains("base_folder: GitHub"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&path).expect("meta").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "expected 0600, got {mode:o}");
    }
}

#[test]
fn state_survives_config_rewrite() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::init_at(home.path(), sample()).expect("init");

    let mut st = state::SyncState::default();
    st.record_run(
        ["octo/docs".to_string()].into_iter().collect(),
        chrono::Utc::now(),
    );
    state::save_at(home.path(), &st).expect("save state");

    let mut cfg = config::load_at(home.path()).expect("load");
    cfg.namespaces.push("other".to_string());
    config::save_at(home.path(), &cfg).expect("save config");

    let loaded = state::load_at(home.path()).expect("load state");
    assert_eq!(loaded, st);
    home.child(".docmirror/state.json")
        .assert(predicate::str::contains("octo/docs"));
}
