// JSON-file archive sink for finished poems.
//
// The archive is a single JSON array of poem records. Appending reads the
// existing array (missing or empty file = empty array), pushes the new
// record, and rewrites the file. Append-only at the record level: existing
// entries are never modified or removed.

use std::path::{Path, PathBuf};

use crate::error::OracleError;
use crate::traits::{ArchiveSink, PoemRecord};

/// Durable poem archive backed by a JSON array file.
#[derive(Debug, Clone)]
pub struct JsonArchive {
    path: PathBuf,
}

impl JsonArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonArchive { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records currently in the archive.
    pub fn records(&self) -> Result<Vec<PoemRecord>, OracleError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&data)?)
    }
}

impl ArchiveSink for JsonArchive {
    fn append(&mut self, record: &PoemRecord) -> Result<(), OracleError> {
        let mut records = self.records()?;
        records.push(record.clone());
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
