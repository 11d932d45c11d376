use crate::manifest::BinField;
use crate::workspace::PackageInfo;
use std::path::{Component, Path, PathBuf};

/// Resolve the executable `requested` declared by `pkg`'s `bin` field.
///
/// Returns the absolute, normalized path of the executable, or `None` when
/// the field does not declare `requested` or when the declared path leaves
/// the package directory (through `..`, an absolute path, or anything
/// equivalent). The package directory itself is an acceptable result. A
/// relative package path is taken relative to the current directory.
pub fn resolve_bin_path(
    pkg: &PackageInfo,
    bin: Option<&BinField>,
    requested: &str,
) -> Option<PathBuf> {
    let relative = bin?.entry_for(&pkg.name, requested)?;

    let package_dir = normalize(&std::path::absolute(&pkg.path).ok()?);
    let resolved = normalize(&package_dir.join(relative));

    // Component-wise prefix: `/a/pkg-evil` does not start with `/a/pkg`.
    if resolved.starts_with(&package_dir) {
        Some(resolved)
    } else {
        None
    }
}

/// Lexically normalize a path: drop `.` and redundant separators, fold `..`
/// into its parent. Does not touch the filesystem, so symlinks are not
/// followed. `..` above the root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
