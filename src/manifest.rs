//! Reading `package.json` manifests.
//!
//! Only the parts this crate cares about are typed: the polymorphic `bin`
//! field gets its own variant type, everything else stays as raw JSON so that
//! metadata like `repository` or `author` can be forwarded as-is.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MANIFEST_FILE: &str = "package.json";

/// Shape of the `bin` field of a manifest.
///
/// `Single` means one executable named after the package. `Named` maps
/// executable names to paths; values that are not strings are kept so the
/// resolver can reject them. `Other` absorbs any other JSON type (numbers,
/// booleans, arrays), which never resolves to anything.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BinField {
    Single(String),
    Named(BTreeMap<String, Value>),
    Other(Value),
}

impl BinField {
    /// Relative path declared for `requested`, if any.
    ///
    /// `package_name` is needed for the `Single` form, where the executable
    /// name is implied by the package name. Empty paths never match.
    pub fn entry_for(&self, package_name: &str, requested: &str) -> Option<&str> {
        let path = match self {
            BinField::Single(path) if package_name == requested => path.as_str(),
            BinField::Named(entries) => entries.get(requested)?.as_str()?,
            _ => return None,
        };
        (!path.is_empty()).then_some(path)
    }
}

/// A parsed manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub bin: Option<BinField>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Manifest {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String value of `key`, ignoring non-string values.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("{} not found", .path.display())]
    NotFound { path: PathBuf },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Read and parse the manifest located in `dir`.
pub fn read_manifest(dir: &Path) -> Result<Manifest, ManifestError> {
    let path = dir.join(MANIFEST_FILE);
    let content = std::fs::read_to_string(&path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ManifestError::NotFound { path: path.clone() }
        } else {
            ManifestError::Io {
                path: path.clone(),
                source,
            }
        }
    })?;
    serde_json::from_str(&content).map_err(|source| ManifestError::Parse { path, source })
}
