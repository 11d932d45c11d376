//! Run a bin script provided by any package of a pnpm or npm/yarn workspace.
//!
//! Given a command name, the crate locates the workspace root, lists its
//! packages, finds the single package whose manifest declares an executable
//! with that name and runs it with the environment `npm exec` would provide.
//! Bin paths that would leave their package directory are never resolved.
//!
//! The main entry point is [`Runner`]. Discovery and process spawning are
//! pluggable through [`PackageDiscovery`] and [`command::Launcher`].

pub mod command;
pub mod env;
mod error;
mod executor;
mod external;
mod manifest;
mod matcher;
mod resolver;
mod runner;
mod workspace;

pub use error::{DiscoveryError, HandledError};
pub use executor::{Executor, is_node_executable};
pub use external::{NodeRuntime, SystemLauncher};
pub use manifest::{BinField, Manifest, ManifestError, read_manifest};
pub use matcher::{BinInfo, find_matching_bins};
pub use resolver::resolve_bin_path;
pub use runner::{RunOptions, Runner};
pub use workspace::{
    NpmWorkspacesDiscovery, PackageDiscovery, PackageInfo, PnpmDiscovery, Workspace,
    WorkspaceDiscovery, WorkspaceManager, find_workspace_root, find_workspace_root_within,
};
