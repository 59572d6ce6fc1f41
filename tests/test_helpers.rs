// Test helpers for isolated testing
// Provides temporary cache/install directories and fixture bottles

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::GzEncoder;
use std::path::{Path, PathBuf};
use tar::{Builder, EntryType, Header};
use tempfile::TempDir;

/// Contents of the file every fixture bottle carries at its root
pub const UNTAR_CONTENTS: &str = "Bottle poured from a GitHub release\n";

/// Release listing served by the stubbed `releases/tags/bottles` endpoint
pub const RELEASE_RESPONSE: &str = include_str!("fixtures/release_response.json");

/// Isolated test environment using temporary directories
/// Automatically cleaned up when dropped (RAII pattern)
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub cache: PathBuf,
    pub install: PathBuf,
}

impl TestEnvironment {
    /// Create a new isolated test environment
    ///
    /// - temp/
    ///   - cache/     (downloaded bottles, created on demand)
    ///   - install/   (pour target, created on demand)
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = temp_dir.path().join("cache");
        let install = temp_dir.path().join("install");

        Self {
            temp_dir,
            cache,
            install,
        }
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// One entry of a fixture archive
pub enum FixtureEntry<'a> {
    Dir(&'a str),
    File(&'a str, &'a [u8]),
    Symlink(&'a str, &'a str),
    HardLink(&'a str, &'a str),
}

/// Build a gzip-compressed tar archive in memory
pub fn build_archive(entries: &[FixtureEntry<'_>]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = Builder::new(encoder);

    for entry in entries {
        let mut header = Header::new_gnu();
        match entry {
            FixtureEntry::Dir(path) => {
                header.set_entry_type(EntryType::Directory);
                header.set_mode(0o755);
                header.set_size(0);
                builder
                    .append_data(&mut header, path, std::io::empty())
                    .unwrap();
            }
            FixtureEntry::File(path, data) => {
                header.set_entry_type(EntryType::Regular);
                header.set_mode(0o644);
                header.set_size(data.len() as u64);
                builder.append_data(&mut header, path, *data).unwrap();
            }
            FixtureEntry::Symlink(path, target) => {
                header.set_entry_type(EntryType::Symlink);
                header.set_mode(0o777);
                header.set_size(0);
                builder.append_link(&mut header, path, target).unwrap();
            }
            FixtureEntry::HardLink(path, target) => {
                header.set_entry_type(EntryType::Link);
                header.set_mode(0o644);
                header.set_size(0);
                builder.append_link(&mut header, path, target).unwrap();
            }
        }
    }

    builder.into_inner().unwrap().finish().unwrap()
}

/// Bottle laid out the way release bottles are: `test-bottle/1.0.0/...`
pub fn test_bottle_archive() -> Vec<u8> {
    build_archive(&[
        FixtureEntry::Dir("test-bottle/"),
        FixtureEntry::Dir("test-bottle/1.0.0/"),
        FixtureEntry::File("test-bottle/1.0.0/test_untar.txt", UNTAR_CONTENTS.as_bytes()),
        FixtureEntry::Dir("test-bottle/1.0.0/bin/"),
        FixtureEntry::File("test-bottle/1.0.0/bin/test-bottle", b"#!/bin/sh\necho hi\n"),
    ])
}

/// Write bytes to `dir/name` and return the path
pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_cleanup() {
        let cache_path = {
            let env = TestEnvironment::new();
            std::fs::create_dir_all(&env.cache).unwrap();
            env.cache.clone()
        };

        // After env is dropped, temp directory should be cleaned up
        assert!(!cache_path.exists());
    }

    #[test]
    fn test_fixture_archive_is_gzip() {
        let archive = test_bottle_archive();
        assert_eq!(&archive[..2], &[0x1f, 0x8b]);
    }
}
