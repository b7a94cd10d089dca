use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use claimflow_core::domain::claim::{Claim, ClaimId, ClaimStatus, NewClaim};

use super::{ClaimRepository, RepositoryError};

struct ClaimTable {
    claims: BTreeMap<ClaimId, Claim>,
    next_id: u64,
}

impl Default for ClaimTable {
    fn default() -> Self {
        Self { claims: BTreeMap::new(), next_id: 1 }
    }
}

/// Process-local claim store. Ids come from a counter that starts at 1 and is
/// never rewound, so ids of deleted claims are not reused and map order is
/// insertion order.
#[derive(Default)]
pub struct InMemoryClaimRepository {
    table: RwLock<ClaimTable>,
}

impl InMemoryClaimRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ClaimRepository for InMemoryClaimRepository {
    async fn create(
        &self,
        claim: NewClaim,
        submitted_at: DateTime<Utc>,
    ) -> Result<ClaimId, RepositoryError> {
        let mut table = self.table.write().await;
        let id = ClaimId(table.next_id);
        table.next_id += 1;
        table.claims.insert(id, Claim::submitted(id, claim, submitted_at));
        Ok(id)
    }

    async fn find(&self, id: ClaimId) -> Result<Option<Claim>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.claims.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Claim>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.claims.values().cloned().collect())
    }

    async fn update(&self, id: ClaimId, claim: Claim) -> Result<(), RepositoryError> {
        let mut table = self.table.write().await;
        match table.claims.get_mut(&id) {
            Some(stored) => {
                *stored = Claim { id, ..claim };
                Ok(())
            }
            None => Err(RepositoryError::NotFound(id)),
        }
    }

    async fn delete(&self, id: ClaimId) -> Result<(), RepositoryError> {
        let mut table = self.table.write().await;
        let status = match table.claims.get(&id) {
            Some(claim) => claim.status(),
            None => return Err(RepositoryError::NotFound(id)),
        };
        if status != ClaimStatus::Pending {
            return Err(RepositoryError::InvalidState { id, status });
        }
        table.claims.remove(&id);
        Ok(())
    }
}
