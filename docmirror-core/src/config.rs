//! YAML configuration file.
//!
//! # Storage layout
//!
//! ```text
//! ~/.docmirror/
//!   config.yaml   (mode 0600 — holds the access token)
//!   state.json    (cross-run baseline, see `state`)
//! ```
//!
//! # API pattern
//!
//! Every function touching the filesystem has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::{RepoId, RepoOrigin, RepoRef, DEFAULT_BRANCH};

/// Environment variable that overrides `token` from the config file.
pub const TOKEN_ENV: &str = "DOCMIRROR_TOKEN";

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_BASE_FOLDER: &str = "GitHub";

// ---------------------------------------------------------------------------
// 1. Schema
// ---------------------------------------------------------------------------

/// Root of `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Root directory of the local store (e.g. a notes vault).
    pub base_path: PathBuf,
    /// Folder inside the store that receives `<owner>/<repo>` trees.
    #[serde(default = "default_base_folder")]
    pub base_folder: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Users or organizations whose repositories are auto-discovered.
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub filters: DiscoveryFilters,
    /// Explicitly configured repositories; these always win over discovery.
    #[serde(default)]
    pub repositories: Vec<ManualRepo>,
    /// Daemon timer interval; `0` disables the timer.
    #[serde(default)]
    pub sync_interval_minutes: u64,
    #[serde(default)]
    pub toggles: Toggles,
}

/// Auto-discovery filters applied to every namespace listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryFilters {
    #[serde(default)]
    pub include_private: bool,
    #[serde(default)]
    pub include_forks: bool,
    #[serde(default)]
    pub include_archived: bool,
    /// `*` wildcard pattern matched against the repository name.
    #[serde(default = "default_name_glob")]
    pub name_glob: String,
}

impl Default for DiscoveryFilters {
    fn default() -> Self {
        Self {
            include_private: false,
            include_forks: false,
            include_archived: false,
            name_glob: default_name_glob(),
        }
    }
}

/// One explicitly configured repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualRepo {
    /// `owner/repo`
    pub repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// Feature switches for the annotation pipeline and listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggles {
    #[serde(default = "enabled")]
    pub metadata_header: bool,
    #[serde(default = "enabled")]
    pub readonly_banner: bool,
    #[serde(default = "enabled")]
    pub backlinks: bool,
    #[serde(default)]
    pub sync_media: bool,
    #[serde(default = "enabled")]
    pub auto_discover: bool,
}

impl Default for Toggles {
    fn default() -> Self {
        Self {
            metadata_header: true,
            readonly_banner: true,
            backlinks: true,
            sync_media: false,
            auto_discover: true,
        }
    }
}

fn enabled() -> bool {
    true
}

fn default_base_folder() -> String {
    DEFAULT_BASE_FOLDER.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_name_glob() -> String {
    "*".to_string()
}

impl MirrorConfig {
    /// A config with defaults for everything but the store root.
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            token: None,
            base_path,
            base_folder: default_base_folder(),
            api_url: default_api_url(),
            namespaces: vec![],
            filters: DiscoveryFilters::default(),
            repositories: vec![],
            sync_interval_minutes: 0,
            toggles: Toggles::default(),
        }
    }

    /// Token from `DOCMIRROR_TOKEN`, falling back to the config file.
    pub fn resolved_token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.token.clone().filter(|t| !t.trim().is_empty()))
    }

    /// `base_folder` as a relative path inside the store.
    pub fn base_folder_path(&self) -> PathBuf {
        self.base_folder
            .split('/')
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Explicit repositories as [`RepoRef`]s, first occurrence wins on
    /// duplicate identity.
    pub fn manual_repos(&self) -> Result<Vec<RepoRef>, ConfigError> {
        let mut seen = HashSet::<RepoId>::new();
        let mut out = Vec::new();
        for entry in &self.repositories {
            let branch = entry
                .branch
                .as_deref()
                .filter(|b| !b.trim().is_empty())
                .unwrap_or(DEFAULT_BRANCH);
            let repo = RepoRef::parse(&entry.repo, branch, RepoOrigin::Manual).ok_or_else(|| {
                ConfigError::InvalidRepo {
                    spec: entry.repo.clone(),
                }
            })?;
            if seen.insert(repo.id()) {
                out.push(repo);
            }
        }
        Ok(out)
    }

    /// Namespaces that discovery should query (empty when disabled).
    pub fn discovery_namespaces(&self) -> Vec<String> {
        if !self.toggles.auto_discover {
            return vec![];
        }
        self.namespaces
            .iter()
            .map(|ns| ns.trim().to_string())
            .filter(|ns| !ns.is_empty())
            .collect()
    }

    /// Check everything that must hold before any network activity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolved_token().is_none() {
            return Err(ConfigError::MissingToken);
        }
        let folder = Path::new(&self.base_folder);
        let relative = !self.base_folder.trim().is_empty()
            && folder
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !relative {
            return Err(ConfigError::InvalidBaseFolder {
                value: self.base_folder.clone(),
            });
        }
        let manual = self.manual_repos()?;
        if manual.is_empty() && self.discovery_namespaces().is_empty() {
            return Err(ConfigError::NothingToSync);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 2. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.docmirror/`
pub fn docmirror_root(home: &Path) -> PathBuf {
    home.join(".docmirror")
}

/// `<home>/.docmirror/config.yaml`. Pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    docmirror_root(home).join("config.yaml")
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Load `<home>/.docmirror/config.yaml`.
///
/// Returns `ConfigError::ConfigNotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(home: &Path) -> Result<MirrorConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<MirrorConfig, ConfigError> {
    load_at(&home()?)
}

// ---------------------------------------------------------------------------
// 4. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save the config.
///
/// Write flow: serialize → `config.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, config: &MirrorConfig) -> Result<(), ConfigError> {
    let dir = docmirror_root(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        set_dir_permissions(&dir)?;
    }
    let path = config_path_at(home);
    let tmp_path = path.with_file_name("config.yaml.tmp");

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml).map_err(|e| io_err(&tmp_path, e))?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(config: &MirrorConfig) -> Result<(), ConfigError> {
    save_at(&home()?, config)
}

// ---------------------------------------------------------------------------
// 5. Init
// ---------------------------------------------------------------------------

/// Write `config` unless a config already exists.
///
/// Idempotent: if the file already exists, loads and returns it unchanged.
pub fn init_at(home: &Path, config: MirrorConfig) -> Result<MirrorConfig, ConfigError> {
    if config_path_at(home).exists() {
        return load_at(home);
    }
    save_at(home, &config)?;
    Ok(config)
}

/// `init_at` convenience wrapper.
pub fn init(config: MirrorConfig) -> Result<MirrorConfig, ConfigError> {
    init_at(&home()?, config)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

pub(crate) fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
