//! Remote contract/financial domain: types and capability port
//!
//! The financial domain (contracts, GL accounts, journal entries) lives in
//! a separate service. This module defines the types that cross that
//! boundary and the [`FinancialPort`] capability trait the orchestrator
//! consumes. Remote failures surface as `Network`/`NotFound` errors and
//! are propagated to callers unchanged.

use crate::errors::{DomainError, DomainResult};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Lifecycle status of a contract in the financial domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStatus {
    /// Being drafted; not yet billable
    Draft,
    /// Signed and in force
    Active,
    /// Fulfilled
    Completed,
    /// Cancelled before fulfilment
    Cancelled,
}

/// One billable line on a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractLine {
    /// Human-readable description
    pub description: String,
    /// Line total
    pub total: Decimal,
    /// GL account number this line posts revenue to
    pub gl_account_id: String,
}

/// A contract as served by the financial domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// Contract identifier in the financial domain
    pub id: Uuid,
    /// Lifecycle status
    pub status: ContractStatus,
    /// Service lines
    pub services: Vec<ContractLine>,
    /// Product lines
    pub products: Vec<ContractLine>,
}

impl Contract {
    /// Sum of all service and product line totals
    pub fn total(&self) -> Decimal {
        self.services
            .iter()
            .chain(self.products.iter())
            .map(|line| line.total)
            .sum()
    }
}

/// A general-ledger account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlAccount {
    /// Account identifier in the financial domain
    pub id: Uuid,
    /// Account number, e.g. "4100"
    pub number: String,
    /// Account display name
    pub name: String,
}

/// One debit or credit line of a journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// GL account number the line posts to
    pub account_number: String,
    /// Debit amount; zero on credit lines
    pub debit: Decimal,
    /// Credit amount; zero on debit lines
    pub credit: Decimal,
    /// Line description
    pub memo: String,
}

impl JournalLine {
    /// Build a debit line
    pub fn debit(account_number: impl Into<String>, amount: Decimal, memo: impl Into<String>) -> Self {
        Self {
            account_number: account_number.into(),
            debit: amount,
            credit: Decimal::ZERO,
            memo: memo.into(),
        }
    }

    /// Build a credit line
    pub fn credit(account_number: impl Into<String>, amount: Decimal, memo: impl Into<String>) -> Self {
        Self {
            account_number: account_number.into(),
            debit: Decimal::ZERO,
            credit: amount,
            memo: memo.into(),
        }
    }
}

/// A journal entry; created unposted, committed by a separate post call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Entry identifier in the financial domain
    pub id: Uuid,
    /// Entry description
    pub memo: String,
    /// Debit/credit lines
    pub lines: Vec<JournalLine>,
    /// Whether the entry has been posted
    pub posted: bool,
}

impl JournalEntry {
    /// Sum of debit amounts across all lines
    pub fn total_debits(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    /// Sum of credit amounts across all lines
    pub fn total_credits(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }
}

/// Command to create a journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateJournalEntry {
    /// Entry description
    pub memo: String,
    /// Debit/credit lines
    pub lines: Vec<JournalLine>,
}

/// Command to create a contract for a converted lead
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateContract {
    /// Local case the contract belongs to
    pub case_id: Uuid,
    /// Service lines
    pub services: Vec<ContractLine>,
    /// Product lines
    pub products: Vec<ContractLine>,
}

/// Capability port onto the remote contract/financial domain
#[async_trait]
pub trait FinancialPort: Send + Sync {
    /// Fetch a contract by id
    async fn get_contract(&self, contract_id: Uuid) -> DomainResult<Contract>;

    /// Resolve a GL account by its account number
    async fn get_gl_account_by_number(&self, number: &str) -> DomainResult<GlAccount>;

    /// Create an unposted journal entry
    async fn create_journal_entry(&self, cmd: CreateJournalEntry) -> DomainResult<JournalEntry>;

    /// Post a previously created journal entry
    async fn post_journal_entry(&self, entry_id: Uuid) -> DomainResult<()>;

    /// Create a contract
    async fn create_contract(&self, cmd: CreateContract) -> DomainResult<Contract>;
}

#[derive(Default)]
struct FinancialState {
    contracts: HashMap<Uuid, Contract>,
    accounts: HashMap<String, GlAccount>,
    journal_entries: HashMap<Uuid, JournalEntry>,
    created_entries: Vec<JournalEntry>,
    posted_entry_ids: Vec<Uuid>,
    created_contracts: Vec<Contract>,
    fail_next_post: bool,
    fail_next_create_contract: bool,
}

/// In-memory financial domain
///
/// Serves seeded contracts and accounts, records every mutating call for
/// verification, and can be armed to fail the next post/create call so
/// partial-completion paths can be exercised.
#[derive(Clone, Default)]
pub struct InMemoryFinancialDomain {
    state: Arc<RwLock<FinancialState>>,
}

impl InMemoryFinancialDomain {
    /// Create an empty financial domain
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_poisoned() -> DomainError {
        DomainError::Network {
            service: "financial".to_string(),
            message: "state lock poisoned".to_string(),
        }
    }

    /// Seed a contract the port will serve
    pub fn seed_contract(&self, contract: Contract) {
        if let Ok(mut state) = self.state.write() {
            state.contracts.insert(contract.id, contract);
        }
    }

    /// Seed a GL account resolvable by number
    pub fn seed_account(&self, account: GlAccount) {
        if let Ok(mut state) = self.state.write() {
            state.accounts.insert(account.number.clone(), account);
        }
    }

    /// Arm the double to fail the next `post_journal_entry` call
    pub fn fail_next_post(&self) {
        if let Ok(mut state) = self.state.write() {
            state.fail_next_post = true;
        }
    }

    /// Arm the double to fail the next `create_contract` call
    pub fn fail_next_create_contract(&self) {
        if let Ok(mut state) = self.state.write() {
            state.fail_next_create_contract = true;
        }
    }

    /// Journal entries created so far, in call order
    pub fn created_journal_entries(&self) -> Vec<JournalEntry> {
        self.state
            .read()
            .map(|s| s.created_entries.clone())
            .unwrap_or_default()
    }

    /// Entry ids successfully posted, in call order
    pub fn posted_entry_ids(&self) -> Vec<Uuid> {
        self.state
            .read()
            .map(|s| s.posted_entry_ids.clone())
            .unwrap_or_default()
    }

    /// Contracts created through the port, in call order
    pub fn created_contracts(&self) -> Vec<Contract> {
        self.state
            .read()
            .map(|s| s.created_contracts.clone())
            .unwrap_or_default()
    }

    /// Look up a journal entry by id
    pub fn journal_entry(&self, entry_id: Uuid) -> Option<JournalEntry> {
        self.state
            .read()
            .ok()
            .and_then(|s| s.journal_entries.get(&entry_id).cloned())
    }
}

#[async_trait]
impl FinancialPort for InMemoryFinancialDomain {
    async fn get_contract(&self, contract_id: Uuid) -> DomainResult<Contract> {
        let state = self.state.read().map_err(|_| Self::lock_poisoned())?;
        state
            .contracts
            .get(&contract_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("Contract", contract_id))
    }

    async fn get_gl_account_by_number(&self, number: &str) -> DomainResult<GlAccount> {
        let state = self.state.read().map_err(|_| Self::lock_poisoned())?;
        state
            .accounts
            .get(number)
            .cloned()
            .ok_or_else(|| DomainError::not_found("GlAccount", number))
    }

    async fn create_journal_entry(&self, cmd: CreateJournalEntry) -> DomainResult<JournalEntry> {
        let mut state = self.state.write().map_err(|_| Self::lock_poisoned())?;
        let entry = JournalEntry {
            id: Uuid::new_v4(),
            memo: cmd.memo,
            lines: cmd.lines,
            posted: false,
        };
        state.journal_entries.insert(entry.id, entry.clone());
        state.created_entries.push(entry.clone());
        Ok(entry)
    }

    async fn post_journal_entry(&self, entry_id: Uuid) -> DomainResult<()> {
        let mut state = self.state.write().map_err(|_| Self::lock_poisoned())?;
        if state.fail_next_post {
            state.fail_next_post = false;
            return Err(DomainError::Network {
                service: "financial".to_string(),
                message: "post_journal_entry unavailable".to_string(),
            });
        }
        let entry = state
            .journal_entries
            .get_mut(&entry_id)
            .ok_or_else(|| DomainError::not_found("JournalEntry", entry_id))?;
        entry.posted = true;
        state.posted_entry_ids.push(entry_id);
        Ok(())
    }

    async fn create_contract(&self, cmd: CreateContract) -> DomainResult<Contract> {
        let mut state = self.state.write().map_err(|_| Self::lock_poisoned())?;
        if state.fail_next_create_contract {
            state.fail_next_create_contract = false;
            return Err(DomainError::Network {
                service: "financial".to_string(),
                message: "create_contract unavailable".to_string(),
            });
        }
        let contract = Contract {
            id: Uuid::new_v4(),
            status: ContractStatus::Active,
            services: cmd.services,
            products: cmd.products,
        };
        state.contracts.insert(contract.id, contract.clone());
        state.created_contracts.push(contract.clone());
        Ok(contract)
    }
}
