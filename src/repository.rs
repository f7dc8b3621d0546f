//! Generic repository over SCD2-versioned entities
//!
//! One repository contract serves every versioned entity in the domain
//! (policies, invitations, templates). The write path is the heart of the
//! SCD2 pattern: saving version N+1 closes version N and inserts the new
//! row as one atomic unit, so no reader ever observes two current rows or
//! none at all mid-write.
//!
//! The repository does not implement optimistic locking. Callers must
//! treat "load current, decide, save next" as a read-modify-write that can
//! race under concurrent writers for the same business key; the storage
//! transaction is the only concurrency primitive.

use crate::errors::{DomainError, DomainResult};
use crate::versioned::{BusinessKey, Scoped, VersionedRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Repository contract for SCD2-versioned entities
#[async_trait]
pub trait VersionedRepository<T>: Send + Sync
where
    T: Scoped + Clone + Send + Sync,
{
    /// Find the current version for a scope (funeral home)
    ///
    /// Entities provisioned one-per-scope (policies) have at most one
    /// chain per scope; for those this returns the single current row, or
    /// `None` if the scope was never provisioned.
    async fn find_current(&self, scope: Uuid) -> DomainResult<Option<VersionedRecord<T>>>;

    /// Find the current version of one entity by its business key
    async fn find_current_by_key(
        &self,
        business_key: BusinessKey<T>,
    ) -> DomainResult<Option<VersionedRecord<T>>>;

    /// All current rows for a scope, `created_at` descending
    async fn list_current(&self, scope: Uuid) -> DomainResult<Vec<VersionedRecord<T>>>;

    /// Full version history, ordered by version descending
    ///
    /// An unknown business key yields an empty history, not an error.
    async fn get_history(
        &self,
        business_key: BusinessKey<T>,
    ) -> DomainResult<Vec<VersionedRecord<T>>>;

    /// Exact version lookup
    async fn get_by_version(
        &self,
        business_key: BusinessKey<T>,
        version: u32,
    ) -> DomainResult<VersionedRecord<T>>;

    /// Persist a version row
    ///
    /// Version 1 inserts a new chain; any later version atomically closes
    /// the existing current row (`valid_to` = the new row's `valid_from`,
    /// `is_current` = false) and inserts the new one. Either both steps
    /// apply or neither does.
    async fn save(&self, new_version: VersionedRecord<T>) -> DomainResult<()>;

    /// Soft-retire an entity: close the current version with no successor
    async fn delete(&self, business_key: BusinessKey<T>) -> DomainResult<()>;
}

/// In-memory repository adapter
///
/// Holds each entity's version chain in insertion order and performs the
/// close+insert pair under a single write guard, the in-process analogue
/// of the storage transaction. Used both as the test double and as the
/// backing store for embedded deployments.
#[derive(Clone)]
pub struct InMemoryVersionedRepository<T> {
    chains: Arc<RwLock<HashMap<Uuid, Vec<VersionedRecord<T>>>>>,
    entity_type: &'static str,
}

impl<T> InMemoryVersionedRepository<T> {
    /// Create an empty repository for the named entity type
    pub fn new(entity_type: &'static str) -> Self {
        Self {
            chains: Arc::new(RwLock::new(HashMap::new())),
            entity_type,
        }
    }

    fn lock_poisoned() -> DomainError {
        DomainError::Persistence("repository lock poisoned".to_string())
    }
}

#[async_trait]
impl<T> VersionedRepository<T> for InMemoryVersionedRepository<T>
where
    T: Scoped + Clone + Send + Sync,
{
    async fn find_current(&self, scope: Uuid) -> DomainResult<Option<VersionedRecord<T>>> {
        let chains = self.chains.read().map_err(|_| Self::lock_poisoned())?;
        let mut matches: Vec<&VersionedRecord<T>> = chains
            .values()
            .flat_map(|chain| chain.iter())
            .filter(|r| r.is_current && r.payload.scope() == scope)
            .collect();
        matches.sort_by_key(|r| r.created_at);
        Ok(matches.pop().cloned())
    }

    async fn find_current_by_key(
        &self,
        business_key: BusinessKey<T>,
    ) -> DomainResult<Option<VersionedRecord<T>>> {
        let chains = self.chains.read().map_err(|_| Self::lock_poisoned())?;
        Ok(chains
            .get(business_key.as_uuid())
            .and_then(|chain| chain.iter().find(|r| r.is_current))
            .cloned())
    }

    async fn list_current(&self, scope: Uuid) -> DomainResult<Vec<VersionedRecord<T>>> {
        let chains = self.chains.read().map_err(|_| Self::lock_poisoned())?;
        let mut rows: Vec<VersionedRecord<T>> = chains
            .values()
            .flat_map(|chain| chain.iter())
            .filter(|r| r.is_current && r.payload.scope() == scope)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get_history(
        &self,
        business_key: BusinessKey<T>,
    ) -> DomainResult<Vec<VersionedRecord<T>>> {
        let chains = self.chains.read().map_err(|_| Self::lock_poisoned())?;
        let mut history = chains
            .get(business_key.as_uuid())
            .cloned()
            .unwrap_or_default();
        history.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(history)
    }

    async fn get_by_version(
        &self,
        business_key: BusinessKey<T>,
        version: u32,
    ) -> DomainResult<VersionedRecord<T>> {
        let chains = self.chains.read().map_err(|_| Self::lock_poisoned())?;
        chains
            .get(business_key.as_uuid())
            .and_then(|chain| chain.iter().find(|r| r.version == version))
            .cloned()
            .ok_or_else(|| {
                DomainError::not_found(
                    self.entity_type,
                    format!("{business_key} v{version}"),
                )
            })
    }

    async fn save(&self, new_version: VersionedRecord<T>) -> DomainResult<()> {
        if !new_version.is_current || new_version.valid_to.is_some() {
            return Err(DomainError::Persistence(
                "new version must be open and current".to_string(),
            ));
        }

        let mut chains = self.chains.write().map_err(|_| Self::lock_poisoned())?;
        let chain = chains
            .entry(*new_version.business_key.as_uuid())
            .or_default();

        if new_version.version == 1 {
            if !chain.is_empty() {
                return Err(DomainError::Persistence(format!(
                    "{} {} already has versions",
                    self.entity_type, new_version.business_key
                )));
            }
        } else {
            // The predecessor must be the open current row; anything else
            // means the caller lost a read-modify-write race or skipped a
            // version, and committing would break the contiguous chain.
            let last_current = chain
                .iter_mut()
                .rev()
                .find(|r| r.is_current);
            match last_current {
                Some(prior) if prior.version + 1 == new_version.version => {
                    prior.close(new_version.valid_from);
                }
                Some(prior) => {
                    return Err(DomainError::Persistence(format!(
                        "{} {}: version {} does not extend current version {}",
                        self.entity_type,
                        new_version.business_key,
                        new_version.version,
                        prior.version
                    )));
                }
                None => {
                    return Err(DomainError::Persistence(format!(
                        "{} {} has no current version to close",
                        self.entity_type, new_version.business_key
                    )));
                }
            }
        }

        tracing::debug!(
            entity = self.entity_type,
            business_key = %new_version.business_key,
            version = new_version.version,
            "saved version"
        );
        chain.push(new_version);
        Ok(())
    }

    async fn delete(&self, business_key: BusinessKey<T>) -> DomainResult<()> {
        let mut chains = self.chains.write().map_err(|_| Self::lock_poisoned())?;
        let current = chains
            .get_mut(business_key.as_uuid())
            .and_then(|chain| chain.iter_mut().find(|r| r.is_current))
            .ok_or_else(|| DomainError::not_found(self.entity_type, business_key))?;
        current.close(chrono::Utc::now());
        tracing::debug!(
            entity = self.entity_type,
            business_key = %business_key,
            "retired entity"
        );
        Ok(())
    }
}
