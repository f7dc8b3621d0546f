//! Cross-domain orchestration: finalize-case and convert-lead
//!
//! Both use cases coordinate the local CRM domain with the remote
//! financial domain in a fixed step sequence: every precondition is
//! checked before the first mutation of any kind, then the remote and
//! local writes run best-effort. There is no distributed transaction and
//! no compensation; a failure after a non-compensable step surfaces as
//! `PartiallyCompleted` carrying what was created, so operators can
//! reconcile instead of guessing.

use crate::cases::{
    CaseRepository, CaseStatus, FuneralCase, LeadRepository, LeadStatus, LineItemKind,
    ProposedLineItem,
};
use crate::errors::{DomainError, DomainResult};
use crate::state::State;
use crate::finance::{
    Contract, ContractLine, ContractStatus, CreateContract, CreateJournalEntry, FinancialPort,
    JournalLine,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use uuid::Uuid;

/// Default accounts-receivable account number
pub const DEFAULT_AR_ACCOUNT: &str = "1200";

/// Revenue partitioned per GL account
///
/// Built from a contract's service and product lines. Debits equal
/// credits by construction: the journal entry derived from a breakdown
/// carries one receivable debit for `total` and one credit per account
/// summing to the same figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueBreakdown {
    /// Sum of every line on the contract
    pub total: Decimal,
    /// Revenue per distinct GL account number
    pub by_account: BTreeMap<String, Decimal>,
}

impl RevenueBreakdown {
    /// Partition a contract's lines per GL account
    pub fn from_contract(contract: &Contract) -> Self {
        let mut by_account: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut total = Decimal::ZERO;
        for line in contract.services.iter().chain(contract.products.iter()) {
            total += line.total;
            *by_account.entry(line.gl_account_id.clone()).or_default() += line.total;
        }
        Self { total, by_account }
    }

    /// Build the balanced journal lines for this breakdown
    pub fn journal_lines(&self, ar_account: &str, case_number: &str) -> Vec<JournalLine> {
        let mut lines = vec![JournalLine::debit(
            ar_account,
            self.total,
            format!("Receivable for case {case_number}"),
        )];
        for (account, amount) in &self.by_account {
            lines.push(JournalLine::credit(
                account.clone(),
                *amount,
                format!("Revenue for case {case_number}"),
            ));
        }
        lines
    }
}

/// Command to finalize a case with GL posting
#[derive(Debug, Clone)]
pub struct FinalizeCase {
    /// Case to finalize
    pub case_id: Uuid,
    /// Acting user
    pub actor: String,
}

/// Aggregate result of a finalize-case run; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeCaseResult {
    /// The finalized case
    pub case_id: Uuid,
    /// The posted journal entry
    pub journal_entry_id: Uuid,
    /// Revenue recognized
    pub total_amount: Decimal,
    /// Every GL account the entry touched, receivable included
    pub gl_accounts_posted: BTreeSet<String>,
}

/// Command to convert a qualified lead into a case with a contract
#[derive(Debug, Clone)]
pub struct ConvertLead {
    /// Lead to convert
    pub lead_id: Uuid,
    /// Case number to open the case under
    pub case_number: String,
    /// Name of the decedent for the new case
    pub decedent_name: String,
    /// Acting user
    pub actor: String,
}

/// Aggregate result of a convert-lead run; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertLeadResult {
    /// The converted lead
    pub lead_id: Uuid,
    /// The case created locally
    pub case_id: Uuid,
    /// The contract created in the financial domain
    pub contract_id: Uuid,
    /// Total of the contract lines
    pub total_amount: Decimal,
}

/// Orchestrator for cross-domain CRM/financial use cases
pub struct CaseOrchestrator {
    cases: Arc<dyn CaseRepository>,
    leads: Arc<dyn LeadRepository>,
    financial: Arc<dyn FinancialPort>,
    ar_account: String,
}

impl CaseOrchestrator {
    /// Assemble the orchestrator with the default receivable account
    pub fn new(
        cases: Arc<dyn CaseRepository>,
        leads: Arc<dyn LeadRepository>,
        financial: Arc<dyn FinancialPort>,
    ) -> Self {
        Self {
            cases,
            leads,
            financial,
            ar_account: DEFAULT_AR_ACCOUNT.to_string(),
        }
    }

    /// Override the accounts-receivable account number
    pub fn with_ar_account(mut self, account_number: impl Into<String>) -> Self {
        self.ar_account = account_number.into();
        self
    }

    /// Finalize a case: validate, build a balanced journal entry in the
    /// financial domain, post it, and stamp the case
    ///
    /// Steps 1-5 are a fail-fast validation gate; nothing is mutated
    /// before the revenue breakdown is computed. Posting failure after
    /// entry creation, or a case update failure after posting, returns
    /// `PartiallyCompleted` with the entry id.
    #[tracing::instrument(skip(self, cmd), fields(case_id = %cmd.case_id))]
    pub async fn finalize_case(&self, cmd: FinalizeCase) -> DomainResult<FinalizeCaseResult> {
        // Steps 1-3: local validation gate.
        let mut case = self
            .cases
            .get(cmd.case_id)
            .await?
            .ok_or_else(|| DomainError::not_found("FuneralCase", cmd.case_id))?;
        if case.status != CaseStatus::Active {
            return Err(DomainError::Validation(format!(
                "case {} is {} and cannot be finalized",
                case.case_number,
                case.status.name()
            )));
        }
        let contract_id = case.contract_id.ok_or_else(|| {
            DomainError::Validation(format!(
                "case {} has no associated contract",
                case.case_number
            ))
        })?;

        // Steps 4-5: contract gate; remote errors propagate unchanged.
        let contract = self.financial.get_contract(contract_id).await?;
        if !matches!(
            contract.status,
            ContractStatus::Active | ContractStatus::Completed
        ) {
            return Err(DomainError::Validation(format!(
                "contract {contract_id} is not billable in its current status"
            )));
        }

        // Step 6: revenue breakdown; balanced by construction.
        let breakdown = RevenueBreakdown::from_contract(&contract);
        if breakdown.by_account.is_empty() {
            return Err(DomainError::Validation(format!(
                "contract {contract_id} has no billable lines"
            )));
        }
        tracing::debug!(total = %breakdown.total, accounts = breakdown.by_account.len(), "computed revenue breakdown");

        // Step 7: resolve every referenced account, receivable included.
        let mut gl_accounts_posted = BTreeSet::new();
        for number in std::iter::once(self.ar_account.as_str())
            .chain(breakdown.by_account.keys().map(String::as_str))
        {
            let account = self.financial.get_gl_account_by_number(number).await?;
            gl_accounts_posted.insert(account.number);
        }

        // Step 8: create the entry, initially unposted.
        let entry = self
            .financial
            .create_journal_entry(CreateJournalEntry {
                memo: format!("Finalization of case {}", case.case_number),
                lines: breakdown.journal_lines(&self.ar_account, &case.case_number),
            })
            .await?;
        tracing::debug!(journal_entry_id = %entry.id, "journal entry created");

        // Step 9: post. The entry already exists remotely; a failure here
        // leaves it unposted and must say so.
        if let Err(err) = self.financial.post_journal_entry(entry.id).await {
            tracing::warn!(journal_entry_id = %entry.id, error = %err, "posting failed after entry creation");
            return Err(DomainError::PartiallyCompleted {
                description: format!(
                    "journal entry {} created but not posted: {err}",
                    entry.id
                ),
                journal_entry_id: Some(entry.id),
            });
        }

        // Step 10: stamp and persist the case.
        case.transition(CaseStatus::Completed)?;
        case.journal_entry_id = Some(entry.id);
        case.revenue_recognized = Some(breakdown.total);
        case.finalized_at = Some(Utc::now());
        case.finalized_by = Some(cmd.actor);
        if let Err(err) = self.cases.update(case).await {
            tracing::warn!(journal_entry_id = %entry.id, error = %err, "case update failed after posting");
            return Err(DomainError::PartiallyCompleted {
                description: format!(
                    "journal entry {} posted but case {} not updated: {err}",
                    entry.id, cmd.case_id
                ),
                journal_entry_id: Some(entry.id),
            });
        }

        tracing::info!(journal_entry_id = %entry.id, total = %breakdown.total, "case finalized");
        Ok(FinalizeCaseResult {
            case_id: cmd.case_id,
            journal_entry_id: entry.id,
            total_amount: breakdown.total,
            gl_accounts_posted,
        })
    }

    /// Convert a qualified lead into a case with a remote contract
    ///
    /// Fail-fast on lead preconditions; the remote contract creation and
    /// the follow-up local writes are best-effort, surfacing
    /// `PartiallyCompleted` once the case exists.
    #[tracing::instrument(skip(self, cmd), fields(lead_id = %cmd.lead_id))]
    pub async fn convert_lead(&self, cmd: ConvertLead) -> DomainResult<ConvertLeadResult> {
        // Validation gate: nothing is created before these pass.
        let mut lead = self
            .leads
            .get(cmd.lead_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Lead", cmd.lead_id))?;
        if lead.status != LeadStatus::Qualified {
            return Err(DomainError::Validation(format!(
                "lead {} is {} and cannot be converted",
                lead.id,
                lead.status.name()
            )));
        }
        if lead.line_items.is_empty() {
            return Err(DomainError::Validation(format!(
                "lead {} has no line items to contract",
                lead.id
            )));
        }

        // Local case first.
        let mut case = FuneralCase::open(lead.funeral_home_id, cmd.case_number, cmd.decedent_name);
        self.cases.insert(case.clone()).await?;
        tracing::debug!(case_id = %case.id, "case created for lead");

        // Remote contract. The case already exists locally, so a remote
        // failure is a partial completion, not a clean abort.
        let (services, products) = partition_lines(&lead.line_items);
        let total_amount: Decimal = lead.line_items.iter().map(|item| item.total).sum();
        let contract = match self
            .financial
            .create_contract(CreateContract {
                case_id: case.id,
                services,
                products,
            })
            .await
        {
            Ok(contract) => contract,
            Err(err) => {
                tracing::warn!(case_id = %case.id, error = %err, "contract creation failed after case insert");
                return Err(DomainError::PartiallyCompleted {
                    description: format!(
                        "case {} created but contract creation failed: {err}",
                        case.id
                    ),
                    journal_entry_id: None,
                });
            }
        };

        // Link and persist; then mark the lead converted.
        case.contract_id = Some(contract.id);
        if let Err(err) = self.cases.update(case.clone()).await {
            return Err(DomainError::PartiallyCompleted {
                description: format!(
                    "case {} and contract {} created but not linked: {err}",
                    case.id, contract.id
                ),
                journal_entry_id: None,
            });
        }

        lead.transition(LeadStatus::Converted)?;
        lead.converted_case_id = Some(case.id);
        if let Err(err) = self.leads.update(lead).await {
            return Err(DomainError::PartiallyCompleted {
                description: format!(
                    "case {} converted from lead {} but lead not marked: {err}",
                    case.id, cmd.lead_id
                ),
                journal_entry_id: None,
            });
        }

        tracing::info!(case_id = %case.id, contract_id = %contract.id, actor = %cmd.actor, "lead converted");
        Ok(ConvertLeadResult {
            lead_id: cmd.lead_id,
            case_id: case.id,
            contract_id: contract.id,
            total_amount,
        })
    }
}

fn partition_lines(items: &[ProposedLineItem]) -> (Vec<ContractLine>, Vec<ContractLine>) {
    let mut services = Vec::new();
    let mut products = Vec::new();
    for item in items {
        let line = ContractLine {
            description: item.description.clone(),
            total: item.total,
            gl_account_id: item.gl_account_id.clone(),
        };
        match item.kind {
            LineItemKind::Service => services.push(line),
            LineItemKind::Product => products.push(line),
        }
    }
    (services, products)
}
