//! Versioned business policies and their resolution
//!
//! Policies are pure configuration payloads, one chain per funeral home,
//! versioned through the SCD2 repository. Resolution always reads the
//! current version at command time; nothing is cached across calls, and
//! there is no implicit default: a funeral home that was never
//! provisioned gets `NotFound`.

use crate::errors::{DomainError, DomainResult};
use crate::repository::VersionedRepository;
use crate::versioned::{Scoped, VersionedRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A versioned business policy payload
pub trait Policy: Scoped {
    /// Entity-type label used in errors and logs
    const KIND: &'static str;

    /// Check the payload's tunables are within their permitted ranges
    fn validate(&self) -> DomainResult<()>;
}

/// Tunables for lead scoring
///
/// Weights are percentages of the composite score and must sum to 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadScoringPolicy {
    /// Owning funeral home
    pub funeral_home_id: Uuid,
    /// Weight of the stated budget, percent
    pub budget_weight: u8,
    /// Weight of the service timeline, percent
    pub timeline_weight: u8,
    /// Weight of engagement signals, percent
    pub engagement_weight: u8,
    /// Composite score at or above which a lead is qualified, 0-100
    pub qualification_threshold: u8,
}

impl Scoped for LeadScoringPolicy {
    fn scope(&self) -> Uuid {
        self.funeral_home_id
    }
}

impl Policy for LeadScoringPolicy {
    const KIND: &'static str = "LeadScoringPolicy";

    fn validate(&self) -> DomainResult<()> {
        let weight_sum = u32::from(self.budget_weight)
            + u32::from(self.timeline_weight)
            + u32::from(self.engagement_weight);
        if weight_sum != 100 {
            return Err(DomainError::Validation(format!(
                "scoring weights must sum to 100, got {weight_sum}"
            )));
        }
        if self.qualification_threshold > 100 {
            return Err(DomainError::Validation(format!(
                "qualification threshold must be 0-100, got {}",
                self.qualification_threshold
            )));
        }
        Ok(())
    }
}

/// Tunables for case-note management
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteManagementPolicy {
    /// Owning funeral home
    pub funeral_home_id: Uuid,
    /// Minimum note content length, characters
    pub min_content_length: u32,
    /// Maximum note content length, characters
    pub max_content_length: u32,
    /// Maximum number of notes attachable to one case
    pub max_notes_per_case: u32,
    /// Hours during which a note remains editable after creation
    pub edit_window_hours: u32,
}

impl Scoped for NoteManagementPolicy {
    fn scope(&self) -> Uuid {
        self.funeral_home_id
    }
}

impl Policy for NoteManagementPolicy {
    const KIND: &'static str = "NoteManagementPolicy";

    fn validate(&self) -> DomainResult<()> {
        if self.min_content_length >= self.max_content_length {
            return Err(DomainError::Validation(format!(
                "min content length {} must be below max {}",
                self.min_content_length, self.max_content_length
            )));
        }
        if self.max_content_length > 10_000 {
            return Err(DomainError::Validation(format!(
                "max content length {} exceeds the 10000 character cap",
                self.max_content_length
            )));
        }
        if self.max_notes_per_case == 0 {
            return Err(DomainError::Validation(
                "max notes per case must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Tunables for invitation token issuance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationPolicy {
    /// Owning funeral home
    pub funeral_home_id: Uuid,
    /// Random token length in bytes, 16-64
    pub token_length_bytes: usize,
    /// Days until an issued token expires, 1-90
    pub expiration_days: i64,
}

impl Scoped for InvitationPolicy {
    fn scope(&self) -> Uuid {
        self.funeral_home_id
    }
}

impl Policy for InvitationPolicy {
    const KIND: &'static str = "InvitationPolicy";

    fn validate(&self) -> DomainResult<()> {
        if !(16..=64).contains(&self.token_length_bytes) {
            return Err(DomainError::Validation(format!(
                "token length must be 16-64 bytes, got {}",
                self.token_length_bytes
            )));
        }
        if !(1..=90).contains(&self.expiration_days) {
            return Err(DomainError::Validation(format!(
                "expiration must be 1-90 days, got {}",
                self.expiration_days
            )));
        }
        Ok(())
    }
}

/// Resolve the effective policy for a funeral home at command time
///
/// Reads the current version on every call. Fails with `Validation` for a
/// nil scope and `NotFound` when the funeral home has never had a policy
/// version created.
pub async fn resolve_policy<P, R>(
    repo: &R,
    funeral_home_id: Uuid,
) -> DomainResult<VersionedRecord<P>>
where
    P: Policy + Clone + Send + Sync,
    R: VersionedRepository<P> + ?Sized,
{
    if funeral_home_id.is_nil() {
        return Err(DomainError::Validation(
            "funeral home scope is required".to_string(),
        ));
    }
    repo.find_current(funeral_home_id)
        .await?
        .ok_or_else(|| DomainError::not_found(P::KIND, funeral_home_id))
}
