//! Workspace boundary detection and package discovery.
//!
//! Two workspace flavours are recognised: pnpm (a `pnpm-workspace.yaml` next
//! to the root manifest) and npm/yarn (a root `package.json` with a
//! `workspaces` field). Discovery is behind [`PackageDiscovery`] so callers
//! can plug in any backend that produces the same list of packages.

use crate::error::{DiscoveryError, HandledError};
use crate::manifest::{Manifest, ManifestError, read_manifest};
use crate::resolver::normalize;
use serde_json::Value;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

pub const PNPM_WORKSPACE_FILE: &str = "pnpm-workspace.yaml";

const UNKNOWN_VERSION: &str = "unknown";

/// A package that belongs to the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: String,
    /// Absolute path of the package directory.
    pub path: PathBuf,
    /// `"unknown"` when the manifest has no version.
    pub version: String,
}

/// Which package manager owns the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceManager {
    Pnpm,
    /// npm or yarn, both declare members in the root manifest.
    Npm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub root: PathBuf,
    pub manager: WorkspaceManager,
}

/// Walk upward from `start` (inclusive) to the closest workspace root.
pub fn find_workspace_root(start: &Path) -> Result<Workspace, HandledError> {
    search_upward(start, None)
}

/// Like [`find_workspace_root`], but the walk stops after `ceiling` has been
/// checked. Directories above `ceiling` are never looked at.
pub fn find_workspace_root_within(
    start: &Path,
    ceiling: &Path,
) -> Result<Workspace, HandledError> {
    search_upward(start, Some(&absolute_normalized(ceiling)))
}

fn search_upward(start: &Path, ceiling: Option<&Path>) -> Result<Workspace, HandledError> {
    let start = absolute_normalized(start);
    for dir in start.ancestors() {
        if let Some(manager) = workspace_marker(dir) {
            debug!(root = %dir.display(), ?manager, "found workspace root");
            return Ok(Workspace {
                root: dir.to_path_buf(),
                manager,
            });
        }
        if ceiling == Some(dir) {
            break;
        }
    }
    Err(HandledError::WorkspaceNotFound { start })
}

fn absolute_normalized(path: &Path) -> PathBuf {
    normalize(&std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()))
}

fn workspace_marker(dir: &Path) -> Option<WorkspaceManager> {
    if dir.join(PNPM_WORKSPACE_FILE).is_file() {
        return Some(WorkspaceManager::Pnpm);
    }
    match read_manifest(dir) {
        Ok(manifest) if manifest.field("workspaces").is_some() => Some(WorkspaceManager::Npm),
        _ => None,
    }
}

/// Source of the list of packages in a workspace.
pub trait PackageDiscovery {
    fn discover(&self, workspace: &Workspace) -> Result<Vec<PackageInfo>, DiscoveryError>;
}

/// Picks the backend matching the workspace's package manager.
#[derive(Debug, Default)]
pub struct WorkspaceDiscovery {
    pnpm: PnpmDiscovery,
    npm: NpmWorkspacesDiscovery,
}

impl PackageDiscovery for WorkspaceDiscovery {
    fn discover(&self, workspace: &Workspace) -> Result<Vec<PackageInfo>, DiscoveryError> {
        match workspace.manager {
            WorkspaceManager::Pnpm => self.pnpm.discover(workspace),
            WorkspaceManager::Npm => self.npm.discover(workspace),
        }
    }
}

/// Asks pnpm itself via `pnpm list --json --depth 0 --recursive`.
#[derive(Debug, Default)]
pub struct PnpmDiscovery;

#[cfg(windows)]
const PNPM: &str = "pnpm.cmd";
#[cfg(not(windows))]
const PNPM: &str = "pnpm";

impl PackageDiscovery for PnpmDiscovery {
    fn discover(&self, workspace: &Workspace) -> Result<Vec<PackageInfo>, DiscoveryError> {
        let output = Command::new(PNPM)
            .args(["list", "--json", "--depth", "0", "--recursive"])
            .current_dir(&workspace.root)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => DiscoveryError::PnpmNotFound,
                _ => DiscoveryError::Failed(e.into()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DiscoveryError::Failed(
                format!("pnpm list exited with {}: {}", output.status, stderr.trim()).into(),
            ));
        }

        parse_pnpm_list(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse the JSON printed by `pnpm list --json`.
///
/// Entries without a name or a path (e.g. an unnamed workspace root) are
/// dropped.
pub fn parse_pnpm_list(stdout: &str) -> Result<Vec<PackageInfo>, DiscoveryError> {
    let value: Value =
        serde_json::from_str(stdout).map_err(|e| DiscoveryError::Failed(e.into()))?;
    let Value::Array(entries) = value else {
        return Err(DiscoveryError::UnexpectedOutput);
    };

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let name = non_empty_str(entry.get("name"))?;
            let path = non_empty_str(entry.get("path"))?;
            Some(PackageInfo {
                name: name.to_string(),
                path: PathBuf::from(path),
                version: non_empty_str(entry.get("version"))
                    .unwrap_or(UNKNOWN_VERSION)
                    .to_string(),
            })
        })
        .collect())
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Reads the `workspaces` field of the root manifest (npm and yarn).
///
/// Supports literal directories and a trailing `/*` wildcard, which covers
/// the layouts seen in practice (`packages/*`, `apps/web`). Other glob forms
/// and negations are skipped with a warning.
#[derive(Debug, Default)]
pub struct NpmWorkspacesDiscovery;

impl PackageDiscovery for NpmWorkspacesDiscovery {
    fn discover(&self, workspace: &Workspace) -> Result<Vec<PackageInfo>, DiscoveryError> {
        let manifest =
            read_manifest(&workspace.root).map_err(|e| DiscoveryError::Failed(e.into()))?;

        let mut seen = HashSet::new();
        let mut packages = Vec::new();
        for pattern in workspace_patterns(&manifest) {
            let dirs = expand_pattern(&workspace.root, pattern)
                .map_err(|e| DiscoveryError::Failed(e.into()))?;
            for dir in dirs {
                if !seen.insert(dir.clone()) {
                    continue;
                }
                if let Some(package) = package_at(&dir) {
                    packages.push(package);
                }
            }
        }
        Ok(packages)
    }
}

fn workspace_patterns(manifest: &Manifest) -> Vec<&str> {
    let list = match manifest.field("workspaces") {
        Some(Value::Array(list)) => list,
        // yarn classic: { "packages": [...], "nohoist": [...] }
        Some(Value::Object(obj)) => match obj.get("packages") {
            Some(Value::Array(list)) => list,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    list.iter().filter_map(Value::as_str).collect()
}

fn expand_pattern(root: &Path, pattern: &str) -> io::Result<Vec<PathBuf>> {
    let pattern = pattern.trim_start_matches("./").trim_end_matches('/');
    if pattern.starts_with('!') {
        warn!(pattern, "negated workspace patterns are not supported, skipping");
        return Ok(Vec::new());
    }

    let (base, wildcard) = match pattern.rsplit_once('/') {
        Some((base, "*")) => (base, true),
        None if pattern == "*" => ("", true),
        _ => (pattern, false),
    };
    if base.contains(['*', '?', '[', '{']) {
        warn!(pattern, "unsupported workspace pattern, skipping");
        return Ok(Vec::new());
    }

    let base = root.join(base);
    if !wildcard {
        return Ok(if base.is_dir() { vec![normalize(&base)] } else { Vec::new() });
    }

    if !base.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(&base)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(normalize(&path));
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn package_at(dir: &Path) -> Option<PackageInfo> {
    let manifest = match read_manifest(dir) {
        Ok(manifest) => manifest,
        Err(ManifestError::NotFound { .. }) => return None,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "skipping workspace member");
            return None;
        }
    };
    let name = manifest.str_field("name").filter(|n| !n.is_empty())?;
    Some(PackageInfo {
        name: name.to_string(),
        path: dir.to_path_buf(),
        version: manifest
            .str_field("version")
            .unwrap_or(UNKNOWN_VERSION)
            .to_string(),
    })
}
