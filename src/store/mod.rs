//! Ledger persistence
//!
//! The ledger state is saved as one snapshot holding four named records
//! (`owner`, `treasury`, `categories`, `expenses`) plus the audit journal.
//! A store must replace the previous snapshot atomically: a reader sees
//! either the old snapshot or the new one, never a mix.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ledger::LedgerState;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(flatten)]
    pub state: LedgerState,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl LedgerSnapshot {
    pub fn new(state: LedgerState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            state,
        }
    }
}

/// Storage backend for ledger snapshots
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the last saved snapshot, `None` if nothing was saved yet
    async fn load(&self) -> Result<Option<LedgerSnapshot>>;

    /// Atomically replace the saved snapshot
    async fn save(&self, snapshot: &LedgerSnapshot) -> Result<()>;
}
