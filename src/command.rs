use std::collections::HashMap;
use std::ffi::OsString;
use std::io;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Fully resolved description of a child process to start.
///
/// `env` is the complete environment of the child: nothing from the parent
/// process leaks in unless it is present in this map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub env: HashMap<OsString, OsString>,
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Normal exit with a status code.
    Exited(i32),
    /// Killed by the given signal number (Unix only).
    Signaled(i32),
    /// Neither a code nor a signal is available.
    Unknown,
}

/// Starts child processes and waits for them.
///
/// Implementations must inherit the standard streams of the current process
/// and block until the child terminates. An `Err` means the child could not
/// be started at all.
pub trait Launcher {
    fn launch(&self, invocation: &Invocation) -> io::Result<Termination>;
}
