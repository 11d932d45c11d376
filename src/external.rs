use crate::command::{Invocation, Launcher, Termination};
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// Launcher backed by real OS processes.
///
/// The child gets exactly the environment of the [`Invocation`], inherits
/// stdin/stdout/stderr and runs in the current working directory.
#[derive(Debug, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, invocation: &Invocation) -> io::Result<Termination> {
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .env_clear()
            .envs(&invocation.env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        Ok(termination(status))
    }
}

fn termination(status: ExitStatus) -> Termination {
    match status.code() {
        Some(code) => Termination::Exited(code),
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(status: ExitStatus) -> Termination {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => Termination::Signaled(signal),
        None => Termination::Unknown,
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_status: ExitStatus) -> Termination {
    Termination::Unknown
}

#[cfg(windows)]
const NODE: &str = "node.exe";
#[cfg(not(windows))]
const NODE: &str = "node";

/// The Node.js installation scripts are run with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRuntime {
    pub exec_path: PathBuf,
    /// As printed by `node --version`, e.g. `v20.11.0`.
    pub version: String,
}

impl NodeRuntime {
    /// Locate `node` in `search_paths` (a PATH-style list).
    ///
    /// Falls back to the bare command name, leaving the lookup to the OS,
    /// and to an `unknown` version when `node --version` cannot be run.
    pub fn detect(search_paths: Option<&OsStr>) -> Self {
        let exec_path = search_paths
            .and_then(|paths| find_in_path(paths, OsStr::new(NODE)))
            .unwrap_or_else(|| PathBuf::from(NODE));
        let version = node_version(&exec_path).unwrap_or_else(|| "unknown".to_string());
        debug!(path = %exec_path.display(), %version, "detected node runtime");
        Self { exec_path, version }
    }
}

fn node_version(exec_path: &Path) -> Option<String> {
    let output = Command::new(exec_path)
        .arg("--version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!version.is_empty()).then_some(version)
}

/// Search each directory of a PATH-style list for `cmd`.
pub fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(cmd))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::ffi::OsString;
    use std::fs::File;

    #[test]
    fn finds_first_match_in_path_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        File::create(second.path().join("tool")).unwrap();
        File::create(first.path().join("tool")).unwrap();

        let paths = std::env::join_paths([first.path(), second.path()]).unwrap();
        let found = find_in_path(&paths, OsStr::new("tool"));
        assert_eq!(found, Some(first.path().join("tool")));
    }

    #[test]
    fn missing_command_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let paths = std::env::join_paths([dir.path()]).unwrap();
        assert_eq!(find_in_path(&paths, OsStr::new("nonexisting")), None);
    }

    #[test]
    fn directories_are_not_commands() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("tool")).unwrap();
        let paths = std::env::join_paths([dir.path()]).unwrap();
        assert_eq!(find_in_path(&paths, OsStr::new("tool")), None);
    }

    #[test]
    fn detect_without_path_falls_back_to_bare_name() {
        let empty = tempfile::tempdir().unwrap();
        let paths = std::env::join_paths([empty.path()]).unwrap();
        let runtime = NodeRuntime::detect(Some(paths.as_os_str()));
        assert_eq!(runtime.exec_path, PathBuf::from(NODE));
    }

    #[cfg(unix)]
    fn sh(script: &str) -> Invocation {
        Invocation {
            program: "/bin/sh".into(),
            args: vec!["-c".into(), script.into()],
            env: HashMap::from([(OsString::from("ONLY_VAR"), OsString::from("42"))]),
        }
    }

    #[test]
    #[cfg(unix)]
    fn system_launcher_reports_exit_code() {
        let outcome = SystemLauncher.launch(&sh("exit 3")).unwrap();
        assert_eq!(outcome, Termination::Exited(3));
    }

    #[test]
    #[cfg(unix)]
    fn system_launcher_passes_exact_environment() {
        let outcome = SystemLauncher
            .launch(&sh(r#"[ "$ONLY_VAR" = 42 ] && [ -z "$CARGO_MANIFEST_DIR" ]"#))
            .unwrap();
        assert_eq!(outcome, Termination::Exited(0));
    }

    #[test]
    #[cfg(unix)]
    fn system_launcher_passes_non_unicode_values() {
        use crate::env::Environment;
        use std::os::unix::ffi::OsStringExt;

        let mut invocation = sh(r#"[ "$LATIN1_VAR" = "$(printf 'caf\351')" ]"#);
        let base = Environment::from_iter([(
            OsString::from("LATIN1_VAR"),
            OsString::from_vec(b"caf\xe9".to_vec()),
        )]);
        invocation.env.extend(base.vars);

        let outcome = SystemLauncher.launch(&invocation).unwrap();
        assert_eq!(outcome, Termination::Exited(0));
    }

    #[test]
    #[cfg(unix)]
    fn system_launcher_reports_signal() {
        let outcome = SystemLauncher.launch(&sh("kill -TERM $$")).unwrap();
        assert_eq!(outcome, Termination::Signaled(15));
    }

    #[test]
    fn system_launcher_fails_to_spawn_missing_program() {
        let invocation = Invocation {
            program: "/definitely/not/here/x-missing".into(),
            args: Vec::new(),
            env: HashMap::new(),
        };
        let err = SystemLauncher.launch(&invocation).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
