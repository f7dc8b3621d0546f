//! Local CRM entities: funeral cases and leads
//!
//! Cases and leads are plain mutable aggregates (their history does not
//! need SCD2 chains); status changes are guarded by the [`State`] trait
//! and persistence goes through thin async repositories.

use crate::errors::{DomainError, DomainResult};
use crate::state::{guard_transition, State};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Lifecycle status of a funeral case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStatus {
    /// Arrangements in progress; the only finalizable status
    Active,
    /// Services rendered and finalized
    Completed,
    /// Closed out; read-only
    Archived,
}

impl State for CaseStatus {
    fn name(&self) -> &'static str {
        match self {
            CaseStatus::Active => "Active",
            CaseStatus::Completed => "Completed",
            CaseStatus::Archived => "Archived",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, CaseStatus::Archived)
    }

    fn can_transition_to(&self, target: &Self) -> bool {
        use CaseStatus::*;
        matches!(
            (self, target),
            (Active, Completed) | (Active, Archived) | (Completed, Archived)
        )
    }
}

/// A funeral case in the local CRM domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuneralCase {
    /// Case identifier
    pub id: Uuid,
    /// Human-facing case number
    pub case_number: String,
    /// Owning funeral home
    pub funeral_home_id: Uuid,
    /// Name of the decedent
    pub decedent_name: String,
    /// Lifecycle status
    pub status: CaseStatus,
    /// Associated contract in the financial domain, once one exists
    pub contract_id: Option<Uuid>,
    /// Journal entry recorded at finalization
    pub journal_entry_id: Option<Uuid>,
    /// Revenue recognized at finalization
    pub revenue_recognized: Option<Decimal>,
    /// When the case was finalized
    pub finalized_at: Option<DateTime<Utc>>,
    /// Who finalized the case
    pub finalized_by: Option<String>,
    /// When the case was created
    pub created_at: DateTime<Utc>,
    /// When the case was last updated
    pub updated_at: DateTime<Utc>,
}

impl FuneralCase {
    /// Open a new active case
    pub fn open(
        funeral_home_id: Uuid,
        case_number: impl Into<String>,
        decedent_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            case_number: case_number.into(),
            funeral_home_id,
            decedent_name: decedent_name.into(),
            status: CaseStatus::Active,
            contract_id: None,
            journal_entry_id: None,
            revenue_recognized: None,
            finalized_at: None,
            finalized_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move the case to a new status, guarding the transition
    pub fn transition(&mut self, target: CaseStatus) -> DomainResult<()> {
        self.status = guard_transition(&self.status, target)?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Kind of a proposed line item on a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineItemKind {
    /// A service (chapel, transport, preparation)
    Service,
    /// A product (casket, urn, flowers)
    Product,
}

/// A line item proposed while working a lead
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedLineItem {
    /// Human-readable description
    pub description: String,
    /// Line total
    pub total: Decimal,
    /// GL account number revenue would post to
    pub gl_account_id: String,
    /// Service or product
    pub kind: LineItemKind,
}

/// Lifecycle status of a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    /// Just captured
    New,
    /// Outreach made
    Contacted,
    /// Meets the scoring policy threshold; convertible
    Qualified,
    /// Converted into a case
    Converted,
    /// Went elsewhere or unresponsive
    Lost,
}

impl State for LeadStatus {
    fn name(&self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::Qualified => "Qualified",
            LeadStatus::Converted => "Converted",
            LeadStatus::Lost => "Lost",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Converted | LeadStatus::Lost)
    }

    fn can_transition_to(&self, target: &Self) -> bool {
        use LeadStatus::*;
        matches!(
            (self, target),
            (New, Contacted)
                | (New, Qualified)
                | (New, Lost)
                | (Contacted, Qualified)
                | (Contacted, Lost)
                | (Qualified, Converted)
                | (Qualified, Lost)
        )
    }
}

/// A pre-need or at-need lead in the local CRM domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Lead identifier
    pub id: Uuid,
    /// Owning funeral home
    pub funeral_home_id: Uuid,
    /// Primary contact name
    pub contact_name: String,
    /// Primary contact email
    pub contact_email: String,
    /// Lifecycle status
    pub status: LeadStatus,
    /// Line items proposed so far
    pub line_items: Vec<ProposedLineItem>,
    /// Case created on conversion
    pub converted_case_id: Option<Uuid>,
    /// When the lead was captured
    pub created_at: DateTime<Utc>,
    /// When the lead was last updated
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Capture a new lead
    pub fn capture(
        funeral_home_id: Uuid,
        contact_name: impl Into<String>,
        contact_email: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            funeral_home_id,
            contact_name: contact_name.into(),
            contact_email: contact_email.into(),
            status: LeadStatus::New,
            line_items: Vec::new(),
            converted_case_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move the lead to a new status, guarding the transition
    pub fn transition(&mut self, target: LeadStatus) -> DomainResult<()> {
        self.status = guard_transition(&self.status, target)?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Repository for funeral cases
#[async_trait]
pub trait CaseRepository: Send + Sync {
    /// Load a case by id
    async fn get(&self, case_id: Uuid) -> DomainResult<Option<FuneralCase>>;

    /// Insert a new case
    async fn insert(&self, case: FuneralCase) -> DomainResult<()>;

    /// Persist changes to an existing case
    async fn update(&self, case: FuneralCase) -> DomainResult<()>;
}

/// Repository for leads
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Load a lead by id
    async fn get(&self, lead_id: Uuid) -> DomainResult<Option<Lead>>;

    /// Insert a new lead
    async fn insert(&self, lead: Lead) -> DomainResult<()>;

    /// Persist changes to an existing lead
    async fn update(&self, lead: Lead) -> DomainResult<()>;
}

#[derive(Default)]
struct CaseStore {
    cases: HashMap<Uuid, FuneralCase>,
    update_count: usize,
    fail_next_update: bool,
}

/// In-memory case repository recording update calls
#[derive(Clone, Default)]
pub struct InMemoryCaseRepository {
    store: Arc<RwLock<CaseStore>>,
}

impl InMemoryCaseRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_poisoned() -> DomainError {
        DomainError::Persistence("case store lock poisoned".to_string())
    }

    /// Number of `update` calls accepted so far
    pub fn update_count(&self) -> usize {
        self.store.read().map(|s| s.update_count).unwrap_or(0)
    }

    /// Arm the repository to fail the next `update` call
    pub fn fail_next_update(&self) {
        if let Ok(mut store) = self.store.write() {
            store.fail_next_update = true;
        }
    }
}

#[async_trait]
impl CaseRepository for InMemoryCaseRepository {
    async fn get(&self, case_id: Uuid) -> DomainResult<Option<FuneralCase>> {
        let store = self.store.read().map_err(|_| Self::lock_poisoned())?;
        Ok(store.cases.get(&case_id).cloned())
    }

    async fn insert(&self, case: FuneralCase) -> DomainResult<()> {
        let mut store = self.store.write().map_err(|_| Self::lock_poisoned())?;
        if store.cases.contains_key(&case.id) {
            return Err(DomainError::Persistence(format!(
                "case {} already exists",
                case.id
            )));
        }
        store.cases.insert(case.id, case);
        Ok(())
    }

    async fn update(&self, case: FuneralCase) -> DomainResult<()> {
        let mut store = self.store.write().map_err(|_| Self::lock_poisoned())?;
        if store.fail_next_update {
            store.fail_next_update = false;
            return Err(DomainError::Persistence(
                "case update unavailable".to_string(),
            ));
        }
        if !store.cases.contains_key(&case.id) {
            return Err(DomainError::not_found("FuneralCase", case.id));
        }
        store.cases.insert(case.id, case);
        store.update_count += 1;
        Ok(())
    }
}

/// In-memory lead repository
#[derive(Clone, Default)]
pub struct InMemoryLeadRepository {
    leads: Arc<RwLock<HashMap<Uuid, Lead>>>,
}

impl InMemoryLeadRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_poisoned() -> DomainError {
        DomainError::Persistence("lead store lock poisoned".to_string())
    }
}

#[async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn get(&self, lead_id: Uuid) -> DomainResult<Option<Lead>> {
        let leads = self.leads.read().map_err(|_| Self::lock_poisoned())?;
        Ok(leads.get(&lead_id).cloned())
    }

    async fn insert(&self, lead: Lead) -> DomainResult<()> {
        let mut leads = self.leads.write().map_err(|_| Self::lock_poisoned())?;
        if leads.contains_key(&lead.id) {
            return Err(DomainError::Persistence(format!(
                "lead {} already exists",
                lead.id
            )));
        }
        leads.insert(lead.id, lead);
        Ok(())
    }

    async fn update(&self, lead: Lead) -> DomainResult<()> {
        let mut leads = self.leads.write().map_err(|_| Self::lock_poisoned())?;
        if !leads.contains_key(&lead.id) {
            return Err(DomainError::not_found("Lead", lead.id));
        }
        leads.insert(lead.id, lead);
        Ok(())
    }
}
