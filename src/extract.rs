//! Bottle extraction into an install directory.
//!
//! Bottles published on a release wrap their content in two directory levels:
//! ```text
//! Archive:     test-bottle/1.0.0/bin/hello
//! Extracts to: {install_dir}/bin/hello
//! ```
//! Both levels are stripped from every entry, like `tar --strip-components=2`.
//! Entries with two or fewer components (the wrapper directories themselves)
//! are skipped.
//!
//! # Examples
//!
//! ```no_run
//! use github_bottles::extract;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let written = extract::extract_bottle(
//!         Path::new("/tmp/cache/hello/hello-2.12.arm64_sonoma.bottle.tar.gz"),
//!         Path::new("/opt/homebrew/Cellar/hello/2.12"),
//!     )?;
//!     println!("Extracted {} entries", written);
//!     Ok(())
//! }
//! ```

use crate::error::InstallError;
use flate2::read::GzDecoder;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};
use tracing::debug;

/// Leading path components dropped from every archive entry
pub const STRIP_COMPONENTS: usize = 2;

/// Hard link whose target may not be on disk yet
struct DeferredHardLink {
    entry: PathBuf,
    link: PathBuf,
    target: PathBuf,
}

/// Extract a gzip-compressed bottle into `install_dir`.
///
/// Symlinks must resolve inside `install_dir`, and nothing is written through
/// a symlink that leaves it. Hard links are created once every other entry is
/// on disk, with their targets stripped the same way as entry paths.
///
/// Returns the number of entries written.
pub fn extract_bottle(bottle_path: &Path, install_dir: &Path) -> Result<usize, InstallError> {
    if !bottle_path.is_file() {
        return Err(InstallError::MissingArchive(bottle_path.to_path_buf()));
    }

    fs::create_dir_all(install_dir).map_err(|source| InstallError::CreateDir {
        path: install_dir.to_path_buf(),
        source,
    })?;
    let root = fs::canonicalize(install_dir).map_err(|source| InstallError::CreateDir {
        path: install_dir.to_path_buf(),
        source,
    })?;

    let file = fs::File::open(bottle_path).map_err(|source| InstallError::Open {
        path: bottle_path.to_path_buf(),
        source,
    })?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);

    let read_error = |source| InstallError::Read {
        path: bottle_path.to_path_buf(),
        source,
    };

    let mut written = 0;
    let mut hard_links = Vec::new();
    for entry in archive.entries().map_err(read_error)? {
        let mut entry = entry.map_err(read_error)?;
        let entry_path = entry.path().map_err(read_error)?.into_owned();

        let kind = entry.header().entry_type();
        match kind {
            EntryType::Regular
            | EntryType::Continuous
            | EntryType::GNUSparse
            | EntryType::Directory
            | EntryType::Symlink
            | EntryType::Link => {}
            EntryType::XGlobalHeader => continue,
            other => {
                return Err(InstallError::UnsupportedEntry {
                    entry: entry_path,
                    kind: format!("{:?}", other),
                });
            }
        }

        let Some(relative) = strip_components(&entry_path, STRIP_COMPONENTS)? else {
            continue;
        };

        if kind.is_hard_link() {
            let link_name = entry
                .link_name()
                .map_err(read_error)?
                .ok_or_else(|| InstallError::UnsafePath(entry_path.clone()))?
                .into_owned();
            let target = strip_components(&link_name, STRIP_COMPONENTS)?
                .ok_or_else(|| InstallError::UnsafePath(link_name.clone()))?;
            hard_links.push(DeferredHardLink {
                entry: entry_path,
                link: relative,
                target,
            });
            continue;
        }

        if kind.is_symlink() {
            let link_name = entry
                .link_name()
                .map_err(read_error)?
                .ok_or_else(|| InstallError::UnsafePath(entry_path.clone()))?;
            if !link_stays_inside(&relative, &link_name) {
                return Err(InstallError::UnsafeLink {
                    entry: entry_path,
                    target: link_name.into_owned(),
                });
            }
        }

        let target = prepare_target(install_dir, &root, &relative, &entry_path)?;
        entry.unpack(&target).map_err(|source| InstallError::Unpack {
            entry: entry_path.clone(),
            source,
        })?;
        written += 1;
    }

    for hard_link in hard_links {
        let source = install_dir.join(&hard_link.target);
        confine(install_dir, &root, &hard_link.target, &hard_link.entry)?;
        let link = prepare_target(install_dir, &root, &hard_link.link, &hard_link.entry)?;

        if link.symlink_metadata().is_ok() {
            fs::remove_file(&link).map_err(|source| InstallError::Unpack {
                entry: hard_link.entry.clone(),
                source,
            })?;
        }
        debug!("Linking {} to {}", link.display(), source.display());
        fs::hard_link(&source, &link).map_err(|source| InstallError::Unpack {
            entry: hard_link.entry.clone(),
            source,
        })?;
        written += 1;
    }

    Ok(written)
}

/// Check the parents of `relative`, create them, and return the on-disk path.
fn prepare_target(
    install_dir: &Path,
    root: &Path,
    relative: &Path,
    entry: &Path,
) -> Result<PathBuf, InstallError> {
    confine(install_dir, root, relative, entry)?;

    let target = install_dir.join(relative);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|source| InstallError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(target)
}

/// Every existing parent of `relative` that is a symlink must resolve under `root`.
fn confine(
    install_dir: &Path,
    root: &Path,
    relative: &Path,
    entry: &Path,
) -> Result<(), InstallError> {
    let Some(parent) = relative.parent() else {
        return Ok(());
    };

    let mut current = install_dir.to_path_buf();
    for component in parent.components() {
        current.push(component);
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                let resolved = fs::canonicalize(&current)
                    .map_err(|_| InstallError::UnsafePath(entry.to_path_buf()))?;
                if !resolved.starts_with(root) {
                    return Err(InstallError::UnsafePath(entry.to_path_buf()));
                }
            }
            Ok(_) => {}
            // Missing parents are created as plain directories
            Err(_) => break,
        }
    }
    Ok(())
}

/// Whether a symlink at `link` (relative to the install dir) pointing to
/// `target` stays inside the install dir, judged on the paths alone.
pub fn link_stays_inside(link: &Path, target: &Path) -> bool {
    let mut depth = link.parent().map_or(0, |p| p.components().count());
    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// Drop the first `count` components of an archive path.
///
/// `None` when nothing is left. Absolute paths and `..` are rejected.
pub fn strip_components(path: &Path, count: usize) -> Result<Option<PathBuf>, InstallError> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            _ => return Err(InstallError::UnsafePath(path.to_path_buf())),
        }
    }

    if parts.len() <= count {
        return Ok(None);
    }

    Ok(Some(parts[count..].iter().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_two_components() {
        let stripped = strip_components(Path::new("test-bottle/1.0.0/bin/hello"), 2).unwrap();
        assert_eq!(stripped, Some(PathBuf::from("bin/hello")));
    }

    #[test]
    fn test_strip_ignores_leading_dot() {
        let stripped = strip_components(Path::new("./test-bottle/1.0.0/README"), 2).unwrap();
        assert_eq!(stripped, Some(PathBuf::from("README")));
    }

    #[test]
    fn test_strip_skips_wrapper_directories() {
        assert_eq!(strip_components(Path::new("test-bottle"), 2).unwrap(), None);
        assert_eq!(strip_components(Path::new("test-bottle/1.0.0/"), 2).unwrap(), None);
    }

    #[test]
    fn test_strip_rejects_escaping_paths() {
        assert!(matches!(
            strip_components(Path::new("a/b/../../../etc/passwd"), 2),
            Err(InstallError::UnsafePath(_))
        ));
        assert!(matches!(
            strip_components(Path::new("/a/b/c"), 2),
            Err(InstallError::UnsafePath(_))
        ));
    }

    #[test]
    fn test_link_stays_inside() {
        assert!(link_stays_inside(Path::new("bin/tool-alias"), Path::new("tool")));
        assert!(link_stays_inside(
            Path::new("lib/pkgconfig/foo.pc"),
            Path::new("../../share/foo.pc")
        ));
        assert!(link_stays_inside(Path::new("current"), Path::new("./lib")));
    }

    #[test]
    fn test_link_escaping_install_dir() {
        assert!(!link_stays_inside(Path::new("lib"), Path::new("/tmp/outside")));
        assert!(!link_stays_inside(Path::new("lib"), Path::new("..")));
        assert!(!link_stays_inside(
            Path::new("bin/tool"),
            Path::new("../../etc/passwd")
        ));
    }

    #[test]
    fn test_missing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.bottle.tar.gz");
        let result = extract_bottle(&missing, &dir.path().join("keg"));
        assert!(matches!(result, Err(InstallError::MissingArchive(_))));
        assert!(!dir.path().join("keg").exists());
    }
}
