//! JSON file store
//!
//! Writes the snapshot to a temporary sibling file and renames it over the
//! target, so an interrupted save never leaves a half-written ledger.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::{LedgerSnapshot, LedgerStore, SNAPSHOT_VERSION};

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

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    async fn load(&self) -> Result<Option<LedgerSnapshot>> {
        if !tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?
        {
            debug!("No ledger state at {}", self.path.display());
            return Ok(None);
        }

        let data = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;

        let snapshot: LedgerSnapshot = serde_json::from_str(&data)
            .map_err(|e| Error::Persistence(format!("{}: {}", self.path.display(), e)))?;

        if snapshot.version > SNAPSHOT_VERSION {
            return Err(Error::Persistence(format!(
                "Unsupported ledger format version {} (expected <= {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        info!(
            "Loaded ledger from {} ({} categories, {} expenses)",
            self.path.display(),
            snapshot.state.categories.len(),
            snapshot.state.expenses.len()
        );
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Persistence(e.to_string()))?;
        }

        let data = serde_json::to_string_pretty(snapshot)
            .map_err(|e| Error::Persistence(e.to_string()))?;

        let temp = self.temp_path();
        tokio::fs::write(&temp, data)
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;

        debug!("Saved ledger to {}", self.path.display());
        Ok(())
    }
}
