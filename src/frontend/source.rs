//! Source file enumeration and reading
//!
//! A package path maps to the source files of one directory. The loader
//! only sees this trait, so packages can come from disk or from memory.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::utils::{Error, Result};

/// Lists and reads the source files of a package
pub trait SourceProvider: Send + Sync {
    /// Source files of the package at `path`, in a stable order
    fn list(&self, path: &str) -> Result<Vec<PathBuf>>;

    /// Text of one file returned by `list`
    fn read(&self, file: &Path) -> Result<String>;
}

/// Packages are directories below a root
#[derive(Debug, Clone)]
pub struct DiskSource {
    root: PathBuf,
    extension: String,
    include_tests: bool,
}

impl DiskSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: "go".to_string(),
            include_tests: false,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_tests(mut self, include_tests: bool) -> Self {
        self.include_tests = include_tests;
        self
    }

    fn wanted(&self, file: &Path) -> bool {
        if file.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
            return false;
        }
        let test_suffix = format!("_test.{}", self.extension);
        self.include_tests
            || !file
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(&test_suffix))
    }
}

impl SourceProvider for DiskSource {
    fn list(&self, path: &str) -> Result<Vec<PathBuf>> {
        let dir = self.root.join(path);
        let entries = fs::read_dir(&dir).map_err(|e| Error::Io(format!("{}: {}", dir.display(), e)))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::Io(format!("{}: {}", dir.display(), e)))?;
            let file = entry.path();
            if file.is_file() && self.wanted(&file) {
                files.push(file);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read(&self, file: &Path) -> Result<String> {
        fs::read_to_string(file).map_err(|e| Error::Io(format!("{}: {}", file.display(), e)))
    }
}

/// In-memory packages, keyed by file path; the parent directory of a
/// file is its package path
#[derive(Debug, Default)]
pub struct MemorySource {
    files: BTreeMap<PathBuf, String>,
    reads: Mutex<HashMap<PathBuf, usize>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, e.g. `with_file("lib/a.go", "package lib")`
    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }

    /// How many times `file` has been read
    pub fn reads(&self, file: impl AsRef<Path>) -> usize {
        self.reads
            .lock()
            .map(|reads| reads.get(file.as_ref()).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl SourceProvider for MemorySource {
    fn list(&self, path: &str) -> Result<Vec<PathBuf>> {
        let dir = Path::new(path);
        let files: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|file| file.parent() == Some(dir))
            .cloned()
            .collect();

        if files.is_empty() {
            return Err(Error::Io(format!("{}: no source files", path)));
        }
        Ok(files)
    }

    fn read(&self, file: &Path) -> Result<String> {
        let text = self
            .files
            .get(file)
            .cloned()
            .ok_or_else(|| Error::Io(format!("{}: no such file", file.display())))?;

        if let Ok(mut reads) = self.reads.lock() {
            *reads.entry(file.to_path_buf()).or_insert(0) += 1;
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_memory_source_lists_one_directory() {
        let source = MemorySource::new()
            .with_file("lib/b.go", "package lib")
            .with_file("lib/a.go", "package lib")
            .with_file("lib/sub/c.go", "package sub");

        let files = source.list("lib").expect("lib has files");
        assert_eq!(files, vec![PathBuf::from("lib/a.go"), PathBuf::from("lib/b.go")]);
        assert!(source.list("missing").is_err());
    }

    #[test]
    fn test_memory_source_counts_reads() {
        let source = MemorySource::new().with_file("lib/a.go", "package lib");
        assert_eq!(source.reads("lib/a.go"), 0);

        source.read(Path::new("lib/a.go")).expect("file exists");
        source.read(Path::new("lib/a.go")).expect("file exists");
        assert_eq!(source.reads("lib/a.go"), 2);
    }

    #[test]
    fn test_disk_source_filters_files() {
        let dir = std::env::temp_dir().join(format!("goinspect-source-{}", std::process::id()));
        let pkg = dir.join("pkg");
        fs::create_dir_all(&pkg).expect("create package dir");
        fs::write(pkg.join("b.go"), "package pkg").expect("write b.go");
        fs::write(pkg.join("a.go"), "package pkg").expect("write a.go");
        fs::write(pkg.join("a_test.go"), "package pkg").expect("write a_test.go");
        fs::write(pkg.join("notes.txt"), "notes").expect("write notes.txt");

        let source = DiskSource::new(&dir);
        let names: Vec<String> = source
            .list("pkg")
            .expect("list package")
            .iter()
            .filter_map(|f| f.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, vec!["a.go", "b.go"]);

        let with_tests = DiskSource::new(&dir).with_tests(true);
        assert_eq!(with_tests.list("pkg").expect("list package").len(), 3);

        fs::remove_dir_all(&dir).ok();
    }
}
