use crate::matcher::BinInfo;
use std::fmt::Write as _;
use std::path::PathBuf;
use thiserror::Error;

/// Expected, user-actionable failures.
///
/// These are rendered as a single `Error: <message>` line without any
/// internal diagnostics and always end the invocation with exit code 1.
/// Everything that is not a `HandledError` is treated as a bug or an
/// environment problem and printed with its full error chain.
#[derive(Debug, Error)]
pub enum HandledError {
    #[error(
        "Could not find workspace root. Make sure you're in a pnpm or npm/yarn workspace \
         (no pnpm-workspace.yaml or package.json with \"workspaces\" found above {}).",
        .start.display()
    )]
    WorkspaceNotFound { start: PathBuf },

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("No packages found in workspace. Is this a valid workspace?")]
    NoPackages,

    #[error("No bin script named \"{0}\" found in any workspace package.")]
    NoMatch(String),

    #[error(
        "Ambiguous bin name \"{name}\". Found {} matches:{}",
        .candidates.len(),
        list_candidates(.candidates)
    )]
    Ambiguous {
        name: String,
        candidates: Vec<BinInfo>,
    },
}

/// Failure of a package discovery backend.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("pnpm command not found. Make sure pnpm is installed.")]
    PnpmNotFound,

    #[error("Unexpected output from pnpm list. Expected an array.")]
    UnexpectedOutput,

    #[error("Failed to discover packages: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

fn list_candidates(candidates: &[BinInfo]) -> String {
    let mut out = String::new();
    for bin in candidates {
        let _ = write!(
            out,
            "\n  - {} ({})",
            bin.package_name,
            bin.package_path.display()
        );
    }
    out
}
