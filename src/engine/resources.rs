//! Static text resources for `header` and `comments` actions.

use crate::ResourceError;
use std::collections::HashMap;
use std::path::PathBuf;

/// Reads the text behind a `file` reference
pub trait ResourceReader {
    fn read(&self, file: &str) -> Result<String, ResourceError>;
}

/// Reads resources from disk, relative to a base directory
#[derive(Debug, Clone)]
pub struct FsResourceReader {
    base_dir: PathBuf,
}

impl FsResourceReader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        FsResourceReader {
            base_dir: base_dir.into(),
        }
    }
}

impl ResourceReader for FsResourceReader {
    fn read(&self, file: &str) -> Result<String, ResourceError> {
        let path = self.base_dir.join(file);
        std::fs::read_to_string(&path).map_err(|e| ResourceError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// In-memory resources, keyed by file reference
#[derive(Debug, Clone, Default)]
pub struct MemoryResourceReader {
    files: HashMap<String, String>,
}

impl MemoryResourceReader {
    pub fn new() -> Self {
        MemoryResourceReader::default()
    }

    pub fn with_file(mut self, file: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(file.into(), content.into());
        self
    }
}

impl ResourceReader for MemoryResourceReader {
    fn read(&self, file: &str) -> Result<String, ResourceError> {
        self.files.get(file).cloned().ok_or_else(|| ResourceError {
            path: file.to_string(),
            message: "not found".to_string(),
        })
    }
}
