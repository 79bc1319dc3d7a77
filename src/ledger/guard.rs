//! Owner authorization guard
//!
//! Every mutating ledger operation calls [`OwnerGuard::authorize`] before
//! touching anything else.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

use super::types::Identity;

/// Capability check against the single owner fixed at initialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerGuard {
    owner: Identity,
}

impl OwnerGuard {
    pub fn new(owner: Identity) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    pub fn is_owner(&self, caller: &Identity) -> bool {
        caller == &self.owner
    }

    /// Fail with `NotOwner` unless the caller is the owner
    pub fn authorize(&self, caller: &Identity, operation: &str) -> Result<()> {
        if !self.is_owner(caller) {
            warn!("Rejected {} from non-owner {}", operation, caller);
            return Err(Error::NotOwner {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_check() {
        let guard = OwnerGuard::new(Identity::new("deployer"));

        assert!(guard.is_owner(&Identity::new("deployer")));
        assert!(!guard.is_owner(&Identity::new("wallet_1")));
        assert!(guard.authorize(&Identity::new("deployer"), "add-funds").is_ok());

        let err = guard
            .authorize(&Identity::new("wallet_1"), "add-funds")
            .unwrap_err();
        assert!(err.is_authorization());
    }
}
