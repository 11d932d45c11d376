use crate::command::{ExitCode, Invocation, Launcher, Termination};
use crate::env::{Environment, EnvironmentBuilder};
use crate::external::{NodeRuntime, SystemLauncher};
use crate::matcher::BinInfo;
use std::cell::OnceCell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions npm runs through node instead of executing directly.
const NODE_EXTENSIONS: [&str; 3] = [".js", ".mjs", ".cjs"];

/// Whether `bin_path` has to be started through node.
///
/// Only the final extension counts (case-insensitive): `cli.JS` is a node
/// script, `cli.js.bak` or an extensionless file is not.
pub fn is_node_executable(bin_path: &Path) -> bool {
    let lower = bin_path.to_string_lossy().to_lowercase();
    NODE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Runs a resolved bin and turns whatever happens into an exit code.
pub struct Executor {
    launcher: Box<dyn Launcher>,
    runtime: OnceCell<NodeRuntime>,
}

impl Executor {
    /// The node runtime is looked up on first execution.
    pub fn new(launcher: Box<dyn Launcher>) -> Self {
        Self {
            launcher,
            runtime: OnceCell::new(),
        }
    }

    pub fn with_runtime(launcher: Box<dyn Launcher>, runtime: NodeRuntime) -> Self {
        Self {
            launcher,
            runtime: OnceCell::from(runtime),
        }
    }

    /// Execute `bin` with `args` in an npm-like environment derived from the
    /// current process environment.
    ///
    /// Never fails: a child that cannot be started, is killed by a signal or
    /// reports no status yields 1, otherwise the child's own exit code.
    pub fn execute(&self, bin: &BinInfo, args: &[String], workspace_root: &Path) -> ExitCode {
        self.execute_with_env(bin, args, workspace_root, &Environment::from_process())
    }

    pub fn execute_with_env(
        &self,
        bin: &BinInfo,
        args: &[String],
        workspace_root: &Path,
        base: &Environment,
    ) -> ExitCode {
        let runtime = self
            .runtime
            .get_or_init(|| NodeRuntime::detect(base.get_os("PATH")));
        let init_cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let env = EnvironmentBuilder::new(runtime.clone(), init_cwd).build(workspace_root, base);

        let invocation = invocation(runtime, bin, args, env);
        debug!(
            program = %Path::new(&invocation.program).display(),
            args = ?invocation.args,
            "spawning"
        );

        match self.launcher.launch(&invocation) {
            Ok(Termination::Exited(code)) => code,
            Ok(Termination::Signaled(signal)) => {
                debug!(signal, "child terminated by signal");
                1
            }
            Ok(Termination::Unknown) => 1,
            Err(e) => {
                warn!(
                    program = %Path::new(&invocation.program).display(),
                    error = %e,
                    "failed to start {}",
                    bin.bin_name
                );
                1
            }
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(Box::new(SystemLauncher))
    }
}

fn invocation(
    runtime: &NodeRuntime,
    bin: &BinInfo,
    args: &[String],
    env: Environment,
) -> Invocation {
    let forwarded = args.iter().map(OsString::from);
    let (program, args) = if is_node_executable(&bin.bin_path) {
        let args: Vec<OsString> = std::iter::once(bin.bin_path.clone().into_os_string())
            .chain(forwarded)
            .collect();
        (runtime.exec_path.clone().into_os_string(), args)
    } else {
        (bin.bin_path.clone().into_os_string(), forwarded.collect::<Vec<_>>())
    };
    Invocation {
        program,
        args,
        env: env.vars,
    }
}
