//! In-process store, used for tests and embedding

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;

use super::{LedgerSnapshot, LedgerStore};

#[derive(Default)]
pub struct MemoryStore {
    snapshot: RwLock<Option<LedgerSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn load(&self) -> Result<Option<LedgerSnapshot>> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        *self.snapshot.write().await = Some(snapshot.clone());
        Ok(())
    }
}
