//! Backlink target for a mirrored file: the README one level up.

/// Target of the `↑ [[...]]` line written into `remote_path`.
///
/// `base_folder` is the base folder as seen from the store root
/// (e.g. `GitHub`). Files at the repository root link to the base folder,
/// files one level deep to the repository README, and deeper files to the
/// README of their directory's parent.
pub fn backlink_target(base_folder: &str, owner: &str, repo: &str, remote_path: &str) -> String {
    let segments: Vec<&str> = remote_path.split('/').filter(|s| !s.is_empty()).collect();
    let dirs = &segments[..segments.len().saturating_sub(1)];
    match dirs.len() {
        0 => base_folder.to_string(),
        1 => format!("{base_folder}/{owner}/{repo}/README"),
        n => format!("{base_folder}/{owner}/{repo}/{}/README", dirs[..n - 1].join("/")),
    }
}
