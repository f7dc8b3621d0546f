//! # fhm-domain
//!
//! Domain core for funeral-home management: SCD2 temporal versioning and
//! cross-domain orchestration.
//!
//! This crate provides the patterns the surrounding CRM reuses across its
//! policy, invitation and template entities:
//! - **Versioned records**: append-only SCD2 chains where a business
//!   change closes the current version and inserts the next one, never
//!   mutating a row in place
//! - **Versioned repository**: one generic contract for current lookup,
//!   history, exact-version reads and the atomic close+insert write
//! - **Policies**: per-funeral-home configuration resolved fresh at
//!   command time, with no implicit defaults
//! - **Invitation lifecycle**: status transitions as new versions, with
//!   expiration derived at read time and policy-driven token issuance
//! - **Memorial templates**: versioned document templates with variable
//!   extraction
//! - **Orchestration**: finalize-case-with-GL-posting and
//!   convert-lead-to-case, coordinating the local CRM with the remote
//!   financial domain under fail-fast validation and explicit
//!   partial-completion reporting
//!
//! ## Design principles
//!
//! 1. **Append-only history**: payloads are immutable once written
//! 2. **Type safety**: phantom-typed business keys cannot be mixed up
//!    across entity types
//! 3. **Typed failures**: every operation returns `DomainResult`, and
//!    callers can distinguish retryable from non-retryable errors
//! 4. **Ports at the seams**: storage, the financial domain and email
//!    dispatch are capability traits with in-memory adapters

#![warn(missing_docs)]

mod cases;
mod errors;
mod finance;
mod invitation;
mod orchestrator;
mod policy;
mod repository;
mod state;
mod template;
mod versioned;

pub use cases::{
    CaseRepository, CaseStatus, FuneralCase, InMemoryCaseRepository, InMemoryLeadRepository, Lead,
    LeadRepository, LeadStatus, LineItemKind, ProposedLineItem,
};
pub use errors::{DomainError, DomainResult};
pub use finance::{
    Contract, ContractLine, ContractStatus, CreateContract, CreateJournalEntry, FinancialPort,
    GlAccount, InMemoryFinancialDomain, JournalEntry, JournalLine,
};
pub use invitation::{
    CreateInvitation, Invitation, InvitationListing, InvitationRole, InvitationService,
    InvitationStatus, ListInvitations, Notifier, OsRngTokenGenerator, RecordingNotifier,
    SequenceTokenGenerator, TokenGenerator,
};
pub use orchestrator::{
    CaseOrchestrator, ConvertLead, ConvertLeadResult, FinalizeCase, FinalizeCaseResult,
    RevenueBreakdown, DEFAULT_AR_ACCOUNT,
};
pub use policy::{
    resolve_policy, InvitationPolicy, LeadScoringPolicy, NoteManagementPolicy, Policy,
};
pub use repository::{InMemoryVersionedRepository, VersionedRepository};
pub use state::{guard_transition, State};
pub use template::{
    extract_variables, MemorialTemplate, TemplateCategory, TemplateSettings,
};
pub use versioned::{BusinessKey, Scoped, VersionedRecord};
