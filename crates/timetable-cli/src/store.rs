//! JSON file persistence
//!
//! The whole document lives in one pretty-printed JSON file. A missing or
//! blank file reads as an empty, unconfigured document.

use std::fs;
use std::path::{Path, PathBuf};

use timetable_core::{DataSource, LoadedDocument, RawDocument, TimetableDocument, TimetableError};
use tracing::debug;

/// Document store backed by a single JSON file
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn failure(&self, action: &str, err: impl std::fmt::Display) -> TimetableError {
        TimetableError::Persistence(format!("{} {}: {}", action, self.path.display(), err))
    }
}

impl DataSource for JsonFileStore {
    fn load(&self) -> Result<LoadedDocument, TimetableError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no data file, starting empty");
            return Ok(LoadedDocument::default());
        }

        let text = fs::read_to_string(&self.path).map_err(|e| self.failure("reading", e))?;
        if text.trim().is_empty() {
            return Ok(LoadedDocument::default());
        }

        let raw: RawDocument =
            serde_json::from_str(&text).map_err(|e| self.failure("parsing", e))?;
        Ok(raw.into_loaded())
    }

    fn save(&self, document: &TimetableDocument) -> Result<(), TimetableError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.failure("creating directory for", e))?;
        }
        let json =
            serde_json::to_string_pretty(document).map_err(|e| self.failure("serializing", e))?;
        fs::write(&self.path, json).map_err(|e| self.failure("writing", e))?;
        debug!(path = %self.path.display(), "document saved");
        Ok(())
    }
}
