//! Corpus discovery.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::Expectation;
use crate::error::{HarnessError, Result};

/// One input document under test.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
pub struct CorpusEntry {
    /// File name, including the classification prefix and extension.
    pub name: String,

    /// Full path of the file.
    pub path: PathBuf,
}

impl CorpusEntry {
    pub fn new(dir: &Path, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: dir.join(&name),
            name,
        }
    }

    pub fn expectation(&self) -> Expectation {
        Expectation::from_filename(&self.name)
    }
}

/// Outcome of scanning a corpus directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Corpus members, sorted by name.
    pub entries: Vec<CorpusEntry>,

    /// Files carrying the corpus extension whose names are not valid UTF-8.
    /// They are never dispatched and are listed in the run summary instead.
    pub skipped: Vec<PathBuf>,
}

impl Discovery {
    /// Every file with the corpus extension, dispatched or not.
    pub fn found(&self) -> usize {
        self.entries.len() + self.skipped.len()
    }
}

/// List every regular file directly inside `dir` whose name ends in
/// `.<extension>`, sorted by name.
///
/// Does not recurse, so the remediation directories nested in the corpus
/// directory are never picked up.
pub fn discover(dir: &Path, extension: &str) -> Result<Discovery> {
    let unreadable = |source: std::io::Error| HarnessError::CorpusUnreadable {
        path: dir.to_path_buf(),
        source,
    };

    match std::fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(unreadable(std::io::Error::new(
                std::io::ErrorKind::Other,
                "not a directory",
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(HarnessError::CorpusMissing {
                path: dir.to_path_buf(),
            })
        }
        Err(e) => return Err(unreadable(e)),
    }

    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let mut discovery = Discovery::default();

    for item in std::fs::read_dir(dir).map_err(unreadable)? {
        let item = item.map_err(unreadable)?;
        let file_type = item.file_type().map_err(unreadable)?;
        if file_type.is_dir() {
            continue;
        }

        let file_name = item.file_name();
        if !file_name.as_encoded_bytes().ends_with(suffix.as_bytes()) {
            continue;
        }

        // Symlinks count when they resolve to a regular file.
        if file_type.is_symlink() && !item.path().is_file() {
            continue;
        }

        match file_name.into_string() {
            Ok(name) => discovery.entries.push(CorpusEntry {
                path: item.path(),
                name,
            }),
            Err(raw) => {
                warn!(
                    name = %raw.to_string_lossy(),
                    "corpus file name is not valid UTF-8, skipping"
                );
                discovery.skipped.push(item.path());
            }
        }
    }

    discovery.entries.sort_by(|a, b| a.name.cmp(&b.name));
    discovery.skipped.sort();
    debug!(
        dir = %dir.display(),
        count = discovery.entries.len(),
        skipped = discovery.skipped.len(),
        "corpus discovered"
    );
    Ok(discovery)
}
