//! Pattern file storage.
//!
//! Pattern files live at `configs/<GROUP_CODE>_PATTERN.json`. The loader only
//! needs to read a file by name, so storage is abstracted behind
//! [`PatternStore`]: an on-disk directory, the bundle compiled into the
//! binary, an in-memory map, or a layered combination of these.

use rust_embed::Embed;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Suffix appended to a group code to form its pattern file name.
pub const PATTERN_FILE_SUFFIX: &str = "_PATTERN.json";

/// Returns the pattern file name for a group code.
#[must_use]
pub fn pattern_file_name(group_code: &str) -> String {
    format!("{group_code}{PATTERN_FILE_SUFFIX}")
}

/// Extracts the group code from a pattern file name.
#[must_use]
pub fn group_code_from_file_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(PATTERN_FILE_SUFFIX)
        .filter(|code| !code.is_empty())
}

/// Read-only source of pattern files.
pub trait PatternStore: Send + Sync {
    /// Reads a pattern file by name; `Ok(None)` when it does not exist.
    fn read(&self, file_name: &str) -> io::Result<Option<String>>;

    /// Group codes this store can serve, sorted.
    fn group_codes(&self) -> Vec<String>;

    /// Short description used in error messages and logs.
    fn describe(&self) -> String;
}

/// Pattern files in a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory this store reads from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PatternStore for DirectoryStore {
    fn read(&self, file_name: &str) -> io::Result<Option<String>> {
        let path = self.root.join(file_name);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn group_codes(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };

        let mut codes: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_str()?;
                group_code_from_file_name(name).map(ToString::to_string)
            })
            .collect();
        codes.sort();
        codes
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

/// Pattern files embedded at compile time from the `configs/` directory.
#[derive(Embed)]
#[folder = "configs"]
#[include = "*_PATTERN.json"]
struct EmbeddedPatterns;

/// The read-only pattern bundle shipped inside the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedStore;

impl PatternStore for EmbeddedStore {
    fn read(&self, file_name: &str) -> io::Result<Option<String>> {
        let Some(file) = EmbeddedPatterns::get(file_name) else {
            return Ok(None);
        };
        String::from_utf8(file.data.into_owned())
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn group_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = EmbeddedPatterns::iter()
            .filter_map(|name| group_code_from_file_name(&name).map(ToString::to_string))
            .collect();
        codes.sort();
        codes
    }

    fn describe(&self) -> String {
        "embedded pattern bundle".to_string()
    }
}

/// In-memory pattern files keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the pattern document for a group code.
    #[must_use]
    pub fn with_pattern(mut self, group_code: &str, json: impl Into<String>) -> Self {
        self.insert(group_code, json);
        self
    }

    /// Adds (or replaces) the pattern document for a group code.
    pub fn insert(&mut self, group_code: &str, json: impl Into<String>) {
        self.files.insert(pattern_file_name(group_code), json.into());
    }
}

impl PatternStore for MemoryStore {
    fn read(&self, file_name: &str) -> io::Result<Option<String>> {
        Ok(self.files.get(file_name).cloned())
    }

    fn group_codes(&self) -> Vec<String> {
        self.files
            .keys()
            .filter_map(|name| group_code_from_file_name(name).map(ToString::to_string))
            .collect()
    }

    fn describe(&self) -> String {
        "in-memory store".to_string()
    }
}

/// Stores consulted in order; the first one holding the file wins.
#[derive(Default)]
pub struct LayeredStore {
    layers: Vec<Box<dyn PatternStore>>,
}

impl LayeredStore {
    /// Creates an empty layered store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a lower-priority layer.
    #[must_use]
    pub fn with_layer(mut self, store: impl PatternStore + 'static) -> Self {
        self.layers.push(Box::new(store));
        self
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// True when no layer is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl PatternStore for LayeredStore {
    fn read(&self, file_name: &str) -> io::Result<Option<String>> {
        for layer in &self.layers {
            if let Some(content) = layer.read(file_name)? {
                return Ok(Some(content));
            }
        }
        Ok(None)
    }

    fn group_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.layers.iter().flat_map(|l| l.group_codes()).collect();
        codes.sort();
        codes.dedup();
        codes
    }

    fn describe(&self) -> String {
        if self.layers.is_empty() {
            return "no pattern stores".to_string();
        }
        self.layers
            .iter()
            .map(|l| l.describe())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
