//! SCD2 temporal versioning primitives
//!
//! Every policy, invitation and template in the domain is stored as an
//! append-only chain of [`VersionedRecord`] rows sharing one
//! [`BusinessKey`]. A business change never mutates a row in place: it
//! closes the current version and inserts the next one. The repository
//! layer guarantees the close+insert pair is atomic; this module defines
//! the record shape and the constructors that keep the chain well-formed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use uuid::Uuid;

/// A typed business key using phantom types for type safety
///
/// The business key is the stable identifier shared by every version of
/// one logical entity. The phantom type parameter ensures keys for
/// different entity types cannot be mixed up at compile time.
///
/// # Examples
///
/// ```rust
/// use fhm_domain::BusinessKey;
///
/// struct Invitation;
/// struct Template;
///
/// let inv_key = BusinessKey::<Invitation>::new();
/// let tpl_key = BusinessKey::<Template>::new();
///
/// // These are different types - won't compile if mixed up:
/// // let _: BusinessKey<Invitation> = tpl_key; // ERROR!
/// # let _ = (inv_key, tpl_key);
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct BusinessKey<T> {
    key: Uuid,
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

// Manual impls so `T` itself does not need to be Clone/Eq/Hash.
impl<T> Clone for BusinessKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BusinessKey<T> {}

impl<T> PartialEq for BusinessKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for BusinessKey<T> {}

impl<T> std::hash::Hash for BusinessKey<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> BusinessKey<T> {
    /// Create a new random business key
    pub fn new() -> Self {
        Self {
            key: Uuid::new_v4(),
            _phantom: PhantomData,
        }
    }

    /// Create a business key from a UUID
    pub fn from_uuid(key: Uuid) -> Self {
        Self {
            key,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.key
    }
}

impl<T> fmt::Display for BusinessKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

impl<T> Default for BusinessKey<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<BusinessKey<T>> for Uuid {
    fn from(key: BusinessKey<T>) -> Self {
        key.key
    }
}

/// Payloads that belong to a scope (in practice, a funeral home)
///
/// `find_current` resolves "the current version for this scope", so every
/// versioned payload must expose its scope key.
pub trait Scoped {
    /// The scope this payload belongs to
    fn scope(&self) -> Uuid;
}

/// A versioned SCD2 row wrapping a domain payload
///
/// Payload fields are immutable once written; a change requires a new
/// version built with [`VersionedRecord::next`], never an in-place edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedRecord<T> {
    /// Unique identifier of this version row
    pub id: Uuid,
    /// Stable identifier shared by all versions of the entity
    pub business_key: BusinessKey<T>,
    /// Version number, contiguous and ascending from 1 per business key
    pub version: u32,
    /// When this version became effective
    pub valid_from: DateTime<Utc>,
    /// When this version stopped being effective; `None` while current
    pub valid_to: Option<DateTime<Utc>>,
    /// True for the single active version of the entity
    pub is_current: bool,
    /// When version 1 was created; preserved across all versions
    pub created_at: DateTime<Utc>,
    /// When this version row was written
    pub updated_at: DateTime<Utc>,
    /// Who created version 1; preserved across all versions
    pub created_by: String,
    /// Who wrote this version row
    pub updated_by: String,
    /// Free-text rationale for this version
    pub reason: Option<String>,
    /// The domain payload
    pub payload: T,
}

impl<T> VersionedRecord<T> {
    /// Build version 1 of a new entity
    pub fn first(business_key: BusinessKey<T>, payload: T, actor: impl Into<String>) -> Self {
        let now = Utc::now();
        let actor = actor.into();
        Self {
            id: Uuid::new_v4(),
            business_key,
            version: 1,
            valid_from: now,
            valid_to: None,
            is_current: true,
            created_at: now,
            updated_at: now,
            created_by: actor.clone(),
            updated_by: actor,
            reason: None,
            payload,
        }
    }

    /// Build the successor version carrying a new payload
    ///
    /// Preserves `business_key`, `created_at` and `created_by` from this
    /// version; bumps `version` by exactly 1. The returned record is not
    /// persisted until passed to the repository's `save`, which closes
    /// this version in the same transaction.
    pub fn next(
        &self,
        payload: T,
        actor: impl Into<String>,
        reason: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            business_key: self.business_key,
            version: self.version + 1,
            valid_from: now,
            valid_to: None,
            is_current: true,
            created_at: self.created_at,
            updated_at: now,
            created_by: self.created_by.clone(),
            updated_by: actor.into(),
            reason,
            payload,
        }
    }

    /// Close this version as of `at`, making it historical
    pub(crate) fn close(&mut self, at: DateTime<Utc>) {
        self.valid_to = Some(at);
        self.is_current = false;
    }
}
