use crate::external::NodeRuntime;
use crate::manifest::read_manifest;
use serde_json::Value;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Key-value view of a process environment.
///
/// Names and values are kept as OS strings, so variables that are not valid
/// unicode are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub vars: HashMap<OsString, OsString>,
}

impl Environment {
    /// Capture the variables of the current process.
    pub fn from_process() -> Self {
        std::env::vars_os().collect()
    }

    /// Value of `key`, if it is set and valid unicode.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.get_os(key)?.to_str()
    }

    pub fn get_os(&self, key: &str) -> Option<&OsStr> {
        self.vars.get(OsStr::new(key)).map(OsString::as_os_str)
    }

    pub fn set_var(&mut self, key: impl Into<OsString>, val: impl Into<OsString>) {
        self.vars.insert(key.into(), val.into());
    }
}

impl<K: Into<OsString>, V: Into<OsString>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(windows)]
const PATH_DELIMITER: &str = ";";
#[cfg(not(windows))]
const PATH_DELIMITER: &str = ":";

/// Root manifest fields forwarded as `npm_package_<field>` besides
/// name, version and description.
const PACKAGE_FIELDS: [&str; 6] = [
    "author",
    "license",
    "homepage",
    "repository",
    "bugs",
    "keywords",
];

const TOOL_NAME: &str = "x";

/// Builds the environment a bin script sees, imitating `npm exec` run from
/// the workspace root.
#[derive(Debug, Clone)]
pub struct EnvironmentBuilder {
    runtime: NodeRuntime,
    init_cwd: PathBuf,
    tool_version: String,
}

impl EnvironmentBuilder {
    pub fn new(runtime: NodeRuntime, init_cwd: PathBuf) -> Self {
        Self {
            runtime,
            init_cwd,
            tool_version: option_env!("CARGO_PKG_VERSION")
                .unwrap_or("0.0.0-development")
                .to_string(),
        }
    }

    /// Copy of `base` with `PATH`, the npm lifecycle variables and the
    /// workspace root's `npm_package_*` metadata applied on top.
    ///
    /// A missing or invalid root manifest only means no metadata is added.
    pub fn build(&self, workspace_root: &Path, base: &Environment) -> Environment {
        let mut env = base.clone();

        let path_key = path_key(base);
        let mut path = workspace_root.join("node_modules").join(".bin").into_os_string();
        if let Some(existing) = base.vars.get(&path_key).filter(|p| !p.is_empty()) {
            path.push(PATH_DELIMITER);
            path.push(existing);
        }
        env.set_var(path_key, path);

        let node = self.runtime.exec_path.as_os_str();
        env.set_var("npm_command", "exec");
        env.set_var("npm_execpath", node);
        env.set_var("npm_node_execpath", node);
        env.set_var("NODE", node);
        env.set_var("INIT_CWD", self.init_cwd.as_os_str());
        env.set_var("npm_config_user_agent", self.user_agent());

        if let Ok(manifest) = read_manifest(workspace_root) {
            let fields = ["name", "version", "description"]
                .into_iter()
                .chain(PACKAGE_FIELDS);
            for field in fields {
                if let Some(value) = manifest.field(field).filter(|v| is_truthy(v)) {
                    env.set_var(format!("npm_package_{field}"), env_value(value));
                }
            }
        }

        env
    }

    /// `x/<version> node/<node version> <platform> <arch>`, the format npm
    /// uses for `npm_config_user_agent`.
    pub fn user_agent(&self) -> String {
        format!(
            "{TOOL_NAME}/{} node/{} {} {}",
            self.tool_version,
            self.runtime.version,
            node_platform(),
            node_arch()
        )
    }
}

/// Windows environment names are case-insensitive and PATH is usually
/// spelled `Path` there.
fn path_key(base: &Environment) -> OsString {
    if cfg!(windows) {
        if let Some(key) = base.vars.keys().find(|k| k.eq_ignore_ascii_case("PATH")) {
            return key.clone();
        }
    }
    OsString::from("PATH")
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Strings verbatim, everything else as compact JSON.
fn env_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `std::env::consts::OS` spelled the way Node's `process.platform` does.
fn node_platform() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

/// `std::env::consts::ARCH` spelled the way Node's `process.arch` does.
fn node_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x64",
        "x86" => "ia32",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        other => other,
    }
}
