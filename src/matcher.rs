use crate::manifest::{ManifestError, read_manifest};
use crate::resolver::resolve_bin_path;
use crate::workspace::PackageInfo;
use std::path::PathBuf;
use tracing::warn;

/// An executable found in one of the workspace packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinInfo {
    pub package_name: String,
    pub package_path: PathBuf,
    pub bin_name: String,
    /// Absolute, always inside `package_path`.
    pub bin_path: PathBuf,
}

/// Collect every package that declares an executable called `bin_name`.
///
/// Results keep the order of `packages`. A package whose manifest cannot be
/// read is skipped; a missing manifest is silent, anything else is logged.
pub fn find_matching_bins(packages: &[PackageInfo], bin_name: &str) -> Vec<BinInfo> {
    let mut matches = Vec::new();
    for pkg in packages {
        let manifest = match read_manifest(&pkg.path) {
            Ok(manifest) => manifest,
            Err(ManifestError::NotFound { .. }) => continue,
            Err(ManifestError::Parse { path, .. }) => {
                warn!(
                    package = %pkg.name,
                    path = %path.display(),
                    "failed to parse package.json: invalid JSON"
                );
                continue;
            }
            Err(err @ ManifestError::Io { .. }) => {
                warn!(package = %pkg.name, error = %err, "could not read package.json");
                continue;
            }
        };

        if let Some(bin_path) = resolve_bin_path(pkg, manifest.bin.as_ref(), bin_name) {
            matches.push(BinInfo {
                package_name: pkg.name.clone(),
                package_path: pkg.path.clone(),
                bin_name: bin_name.to_string(),
                bin_path,
            });
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        /// Create a package directory, with `manifest` as its package.json
        /// unless `None`.
        fn package(&self, name: &str, manifest: Option<&str>) -> PackageInfo {
            let path = self.dir.path().join(name);
            fs::create_dir_all(&path).unwrap();
            if let Some(content) = manifest {
                fs::write(path.join("package.json"), content).unwrap();
            }
            PackageInfo {
                name: name.to_string(),
                path,
                version: "1.0.0".to_string(),
            }
        }
    }

    fn names(bins: &[BinInfo]) -> Vec<&str> {
        bins.iter().map(|b| b.package_name.as_str()).collect()
    }

    #[test]
    fn finds_object_style_bin() {
        let fx = Fixture::new();
        let pkg = fx.package("pkg1", Some(r#"{"name": "pkg1", "bin": {"foo": "./bin/foo.js"}}"#));

        let bins = find_matching_bins(&[pkg.clone()], "foo");
        assert_eq!(
            bins,
            vec![BinInfo {
                package_name: "pkg1".to_string(),
                package_path: pkg.path.clone(),
                bin_name: "foo".to_string(),
                bin_path: pkg.path.join("bin").join("foo.js"),
            }]
        );
    }

    #[test]
    fn finds_string_style_bin_only_for_package_name() {
        let fx = Fixture::new();
        let pkg = fx.package("tool", Some(r#"{"name": "tool", "bin": "cli.js"}"#));

        assert_eq!(names(&find_matching_bins(&[pkg.clone()], "tool")), ["tool"]);
        assert!(find_matching_bins(&[pkg], "cli").is_empty());
    }

    #[test]
    fn no_match_without_bin_field_or_key() {
        let fx = Fixture::new();
        let packages = [
            fx.package("plain", Some(r#"{"name": "plain"}"#)),
            fx.package("other", Some(r#"{"name": "other", "bin": {"bar": "bar.js"}}"#)),
        ];
        assert!(find_matching_bins(&packages, "foo").is_empty());
    }

    #[test]
    fn keeps_input_order_and_reports_all_matches() {
        let fx = Fixture::new();
        let packages = [
            fx.package("b", Some(r#"{"bin": {"dup": "dup.js"}}"#)),
            fx.package("a", Some(r#"{"bin": {"dup": "dup.js"}}"#)),
        ];
        assert_eq!(names(&find_matching_bins(&packages, "dup")), ["b", "a"]);
    }

    #[test]
    fn broken_manifests_do_not_stop_the_scan() {
        let fx = Fixture::new();
        let unreadable = fx.package("unreadable", None);
        fs::create_dir(unreadable.path.join("package.json")).unwrap();
        let packages = [
            fx.package("missing", None),
            fx.package("broken", Some("{ this is not json")),
            unreadable,
            fx.package("good", Some(r#"{"bin": {"foo": "foo.js"}}"#)),
        ];
        assert_eq!(names(&find_matching_bins(&packages, "foo")), ["good"]);
    }

    #[test]
    fn rejects_escaping_bin_paths() {
        let fx = Fixture::new();
        let packages = [
            fx.package("evil1", Some(r#"{"bin": {"foo": "../../../etc/passwd"}}"#)),
            fx.package("evil2", Some(r#"{"bin": {"foo": "/etc/passwd"}}"#)),
        ];
        assert!(find_matching_bins(&packages, "foo").is_empty());
    }
}
