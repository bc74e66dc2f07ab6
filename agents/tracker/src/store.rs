use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use derive_new::new;
use eyre::{bail, Context, Result};

use vibc_core::LifecycleRecord;

/// Keeps the tracked packet's record in a JSON file.
#[derive(Debug, Clone, new)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored record, or `None` if nothing is tracked yet. A record that
    /// fails validation is an error rather than a fresh start.
    pub fn load(&self) -> Result<Option<LifecycleRecord>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read record {:?}", self.path))
            }
        };
        let record: LifecycleRecord = serde_json::from_str(&contents)
            .with_context(|| format!("Malformed record {:?}", self.path))?;
        record
            .validate()
            .with_context(|| format!("Inconsistent record {:?}", self.path))?;
        Ok(Some(record))
    }

    pub fn load_required(&self) -> Result<LifecycleRecord> {
        match self.load()? {
            Some(record) => Ok(record),
            None => bail!(
                "No packet tracked in {:?}, start with `send <tx>`",
                self.path
            ),
        }
    }

    /// Write the record, replacing the previous one atomically.
    pub fn save(&self, record: &LifecycleRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write {tmp:?}"))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace record {:?}", self.path))
    }
}
