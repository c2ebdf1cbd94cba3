//! Byte-reader abstraction over schema storage
//!
//! The pipeline never touches storage directly; every bundle — the embedded
//! builtins, a local schema tree, a patch directory — is consumed through
//! this reader interface, so tests can substitute in-memory trees.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use include_dir::Dir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

pub trait SchemaFs: Send + Sync {
    /// Read the file at a `/`-separated relative path
    fn read(&self, path: &str) -> io::Result<Vec<u8>>;

    /// List a directory at a `/`-separated relative path
    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>>;
}

/// On-disk tree rooted at a directory
pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let mut full = self.root.clone();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            full.push(part);
        }
        full
    }
}

impl SchemaFs for DirFs {
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(path))
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(self.resolve(path))? {
            let entry = entry?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// Tree embedded into the binary at compile time
pub struct EmbeddedFs {
    dir: &'static Dir<'static>,
}

impl EmbeddedFs {
    pub fn new(dir: &'static Dir<'static>) -> Self {
        Self { dir }
    }
}

impl SchemaFs for EmbeddedFs {
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        self.dir
            .get_file(path)
            .map(|f| f.contents().to_vec())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let dir = if path.is_empty() {
            self.dir
        } else {
            self.dir
                .get_dir(path)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))?
        };

        let mut entries: Vec<DirEntry> = dir
            .entries()
            .iter()
            .map(|entry| {
                let name = entry
                    .path()
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                DirEntry {
                    name,
                    is_dir: entry.as_dir().is_some(),
                }
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// In-memory tree for tests
#[derive(Default)]
pub struct MemFs {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), contents.into());
    }
}

impl SchemaFs for MemFs {
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path.trim_end_matches('/'))
        };

        let mut seen = BTreeMap::new();
        for key in self.files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) => seen.insert(dir.to_string(), true),
                None => seen.insert(rest.to_string(), false),
            };
        }

        if seen.is_empty() {
            return Err(io::Error::new(io::ErrorKind::NotFound, path.to_string()));
        }
        Ok(seen
            .into_iter()
            .map(|(name, is_dir)| DirEntry { name, is_dir })
            .collect())
    }
}

/// Extension helpers shared by the file-tree sources
pub fn is_json(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

pub fn is_yaml(name: &str) -> bool {
    Path::new(name).extension().is_some_and(|ext| {
        ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml")
    })
}

pub fn strip_extension(name: &str) -> &str {
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}
