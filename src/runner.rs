use crate::command::ExitCode;
use crate::error::HandledError;
use crate::executor::Executor;
use crate::matcher::find_matching_bins;
use crate::workspace::{
    PackageDiscovery, WorkspaceDiscovery, find_workspace_root, find_workspace_root_within,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Options of a single invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Report what would be executed instead of executing it.
    pub dry_run: bool,
    /// Do not look for the workspace root above this directory.
    pub ceiling: Option<PathBuf>,
}

/// Finds the package that provides a bin and runs it.
///
/// Each call to [`Runner::run`] starts from scratch: the workspace root is
/// located, packages are discovered and their manifests read again.
///
/// Example
/// ```no_run
/// use workspace_x::{RunOptions, Runner};
/// let cwd = std::env::current_dir().unwrap();
/// let args = ["--noEmit".to_string()];
/// let code = Runner::default()
///     .run(&cwd, "tsc", &args, &RunOptions::default(), &mut std::io::stdout())
///     .unwrap();
/// std::process::exit(code);
/// ```
pub struct Runner {
    discovery: Box<dyn PackageDiscovery>,
    executor: Executor,
}

impl Runner {
    pub fn new(discovery: Box<dyn PackageDiscovery>, executor: Executor) -> Self {
        Self {
            discovery,
            executor,
        }
    }

    /// Run the bin `name` with `args`, looking for the workspace from
    /// `start_dir` upward.
    ///
    /// Returns the exit code to terminate with. Expected failures (no
    /// workspace, no packages, no or several matching bins, discovery
    /// failures) are returned as a [`HandledError`] inside the
    /// `anyhow::Error`. The dry-run report goes to `stdout`.
    pub fn run(
        &self,
        start_dir: &Path,
        name: &str,
        args: &[String],
        options: &RunOptions,
        stdout: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        let workspace = match &options.ceiling {
            Some(ceiling) => find_workspace_root_within(start_dir, ceiling)?,
            None => find_workspace_root(start_dir)?,
        };

        let packages = self
            .discovery
            .discover(&workspace)
            .map_err(HandledError::from)?;
        debug!(count = packages.len(), "discovered packages");
        if packages.is_empty() {
            return Err(HandledError::NoPackages.into());
        }

        let mut matches = find_matching_bins(&packages, name);
        let bin = match matches.len() {
            0 => return Err(HandledError::NoMatch(name.to_string()).into()),
            1 => matches.remove(0),
            _ => {
                return Err(HandledError::Ambiguous {
                    name: name.to_string(),
                    candidates: matches,
                }
                .into());
            }
        };
        debug!(package = %bin.package_name, path = %bin.bin_path.display(), "selected bin");

        if options.dry_run {
            writeln!(stdout, "Would execute: {} from {}", bin.bin_name, bin.package_name)?;
            writeln!(stdout, "  Binary: {}", bin.bin_path.display())?;
            writeln!(stdout, "  Arguments: {}", args.join(" "))?;
            return Ok(0);
        }

        Ok(self.executor.execute(&bin, args, &workspace.root))
    }
}

impl Default for Runner {
    /// Discovery picked from the workspace's package manager, real processes.
    fn default() -> Self {
        Self::new(Box::new(WorkspaceDiscovery::default()), Executor::default())
    }
}
