//! Builders for ed2k input and on-disk media fixtures

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Deterministic 32-digit hex hash for fixture number `n`
pub fn fake_hash(n: u32) -> String {
    format!("{n:032x}")
}

/// `ed2k://|file|<path>|<size>|<hash>|` line for `path`
pub fn ed2k_link(path: &Path, size: u64, hash: &str) -> String {
    format!("ed2k://|file|{}|{size}|{hash}|", path.display())
}

/// Successful FILE reply carrying `values` (fid first)
pub fn file_reply(values: &[&str]) -> String {
    format!("220 FILE\n{}", values.join("|"))
}

/// Temporary directory of fake media files
pub struct MediaFixture {
    dir: TempDir,
    files: Vec<(PathBuf, u64, String)>,
}

impl MediaFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create fixture dir"),
            files: Vec::new(),
        }
    }

    /// Create `name` with some content and remember its link data
    pub fn with_file(mut self, name: &str) -> Self {
        let path = self.dir.path().join(name);
        let content = format!("media:{name}");
        fs::write(&path, &content).expect("write fixture file");

        let hash = fake_hash(self.files.len() as u32 + 1);
        self.files.push((path, content.len() as u64, hash));
        self
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, index: usize) -> &Path {
        &self.files[index].0
    }

    pub fn hash(&self, index: usize) -> &str {
        &self.files[index].2
    }

    /// One ed2k line per file, newline-terminated
    pub fn input(&self) -> String {
        self.files
            .iter()
            .map(|(path, size, hash)| format!("{}\n", ed2k_link(path, *size, hash)))
            .collect()
    }

    /// Sorted file names currently in the fixture directory
    pub fn listing(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.dir.path())
            .expect("read fixture dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for MediaFixture {
    fn default() -> Self {
        Self::new()
    }
}
