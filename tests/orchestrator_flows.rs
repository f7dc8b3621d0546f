//! End-to-end tests for the cross-domain orchestrations

use fhm_domain::{
    CaseOrchestrator, CaseRepository, CaseStatus, Contract, ContractLine, ContractStatus,
    ConvertLead, DomainError, FinalizeCase, FuneralCase, GlAccount, InMemoryCaseRepository,
    InMemoryFinancialDomain, InMemoryLeadRepository, Lead, LeadRepository, LeadStatus,
    LineItemKind, ProposedLineItem,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

struct Fixture {
    cases: InMemoryCaseRepository,
    leads: InMemoryLeadRepository,
    financial: InMemoryFinancialDomain,
    orchestrator: CaseOrchestrator,
}

fn fixture() -> Fixture {
    let cases = InMemoryCaseRepository::new();
    let leads = InMemoryLeadRepository::new();
    let financial = InMemoryFinancialDomain::new();
    for (number, name) in [
        ("1200", "Accounts receivable"),
        ("4100", "Service revenue"),
        ("4200", "Merchandise revenue"),
    ] {
        financial.seed_account(GlAccount {
            id: Uuid::new_v4(),
            number: number.to_string(),
            name: name.to_string(),
        });
    }
    let orchestrator = CaseOrchestrator::new(
        Arc::new(cases.clone()),
        Arc::new(leads.clone()),
        Arc::new(financial.clone()),
    );
    Fixture {
        cases,
        leads,
        financial,
        orchestrator,
    }
}

fn line(total: i64, account: &str) -> ContractLine {
    ContractLine {
        description: "line".to_string(),
        total: Decimal::from(total),
        gl_account_id: account.to_string(),
    }
}

/// Seed an active case linked to a contract with the given lines.
async fn seed_case(fx: &Fixture, contract_status: ContractStatus) -> FuneralCase {
    let contract = Contract {
        id: Uuid::new_v4(),
        status: contract_status,
        services: vec![line(5000, "4100"), line(2000, "4100")],
        products: vec![line(8000, "4200")],
    };
    fx.financial.seed_contract(contract.clone());

    let mut case = FuneralCase::open(Uuid::new_v4(), "FH-2026-0107", "W. Calloway");
    case.contract_id = Some(contract.id);
    fx.cases.insert(case.clone()).await.unwrap();
    case
}

fn qualified_lead() -> Lead {
    let mut lead = Lead::capture(Uuid::new_v4(), "D. Whitfield", "d.whitfield@example.com");
    lead.transition(LeadStatus::Qualified).unwrap();
    lead.line_items = vec![
        ProposedLineItem {
            description: "Memorial service".to_string(),
            total: dec!(4200),
            gl_account_id: "4100".to_string(),
            kind: LineItemKind::Service,
        },
        ProposedLineItem {
            description: "Urn".to_string(),
            total: dec!(800),
            gl_account_id: "4200".to_string(),
            kind: LineItemKind::Product,
        },
    ];
    lead
}

#[tokio::test]
async fn finalize_posts_balanced_entry_and_stamps_case() {
    let fx = fixture();
    let case = seed_case(&fx, ContractStatus::Active).await;

    let result = fx
        .orchestrator
        .finalize_case(FinalizeCase {
            case_id: case.id,
            actor: "director@fh".to_string(),
        })
        .await
        .unwrap();

    // The literal scenario: 5000 + 2000 to 4100, 8000 to 4200.
    assert_eq!(result.case_id, case.id);
    assert_eq!(result.total_amount, dec!(15000));
    assert_eq!(
        result.gl_accounts_posted,
        BTreeSet::from(["1200".to_string(), "4100".to_string(), "4200".to_string()])
    );

    let entries = fx.financial.created_journal_entries();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.id, result.journal_entry_id);
    assert_eq!(entry.total_debits(), dec!(15000));
    assert_eq!(entry.total_credits(), dec!(15000));
    assert_eq!(entry.lines.len(), 3);
    assert_eq!(entry.lines[0].account_number, "1200");
    assert_eq!(entry.lines[0].debit, dec!(15000));
    let credit_4100 = entry
        .lines
        .iter()
        .find(|l| l.account_number == "4100")
        .unwrap();
    assert_eq!(credit_4100.credit, dec!(7000));
    let credit_4200 = entry
        .lines
        .iter()
        .find(|l| l.account_number == "4200")
        .unwrap();
    assert_eq!(credit_4200.credit, dec!(8000));
    assert_eq!(fx.financial.posted_entry_ids(), vec![entry.id]);

    let updated = fx.cases.get(case.id).await.unwrap().unwrap();
    assert_eq!(updated.status, CaseStatus::Completed);
    assert_eq!(updated.journal_entry_id, Some(entry.id));
    assert_eq!(updated.revenue_recognized, Some(dec!(15000)));
    assert_eq!(updated.finalized_by.as_deref(), Some("director@fh"));
    assert!(updated.finalized_at.is_some());
}

#[tokio::test]
async fn finalize_unknown_case_is_not_found() {
    let fx = fixture();
    let err = fx
        .orchestrator
        .finalize_case(FinalizeCase {
            case_id: Uuid::new_v4(),
            actor: "director@fh".to_string(),
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn finalize_rejects_case_without_contract_before_any_mutation() {
    let fx = fixture();
    let case = FuneralCase::open(Uuid::new_v4(), "FH-2026-0108", "N. Brandt");
    fx.cases.insert(case.clone()).await.unwrap();

    let err = fx
        .orchestrator
        .finalize_case(FinalizeCase {
            case_id: case.id,
            actor: "director@fh".to_string(),
        })
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert!(fx.financial.created_journal_entries().is_empty());
    assert_eq!(fx.cases.update_count(), 0);
}

#[tokio::test]
async fn finalize_rejects_archived_case_before_any_mutation() {
    let fx = fixture();
    let mut case = seed_case(&fx, ContractStatus::Active).await;
    case.transition(CaseStatus::Archived).unwrap();
    fx.cases.update(case.clone()).await.unwrap();
    let updates_before = fx.cases.update_count();

    let err = fx
        .orchestrator
        .finalize_case(FinalizeCase {
            case_id: case.id,
            actor: "director@fh".to_string(),
        })
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert!(fx.financial.created_journal_entries().is_empty());
    assert_eq!(fx.cases.update_count(), updates_before);
}

#[tokio::test]
async fn finalize_rejects_draft_contract_before_any_mutation() {
    let fx = fixture();
    let case = seed_case(&fx, ContractStatus::Draft).await;

    let err = fx
        .orchestrator
        .finalize_case(FinalizeCase {
            case_id: case.id,
            actor: "director@fh".to_string(),
        })
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert!(fx.financial.created_journal_entries().is_empty());
    assert_eq!(fx.cases.update_count(), 0);
}

#[tokio::test]
async fn finalize_propagates_missing_gl_account_without_creating_entry() {
    let fx = fixture();
    let contract = Contract {
        id: Uuid::new_v4(),
        status: ContractStatus::Active,
        services: vec![line(100, "9999")], // unseeded account
        products: vec![],
    };
    fx.financial.seed_contract(contract.clone());
    let mut case = FuneralCase::open(Uuid::new_v4(), "FH-2026-0109", "P. Voss");
    case.contract_id = Some(contract.id);
    fx.cases.insert(case.clone()).await.unwrap();

    let err = fx
        .orchestrator
        .finalize_case(FinalizeCase {
            case_id: case.id,
            actor: "director@fh".to_string(),
        })
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(fx.financial.created_journal_entries().is_empty());
    assert_eq!(fx.cases.update_count(), 0);
}

#[tokio::test]
async fn finalize_post_failure_reports_partial_completion() {
    let fx = fixture();
    let case = seed_case(&fx, ContractStatus::Active).await;
    fx.financial.fail_next_post();

    let err = fx
        .orchestrator
        .finalize_case(FinalizeCase {
            case_id: case.id,
            actor: "director@fh".to_string(),
        })
        .await
        .unwrap_err();

    let entries = fx.financial.created_journal_entries();
    assert_eq!(entries.len(), 1);
    match err {
        DomainError::PartiallyCompleted {
            journal_entry_id, ..
        } => assert_eq!(journal_entry_id, Some(entries[0].id)),
        other => panic!("expected PartiallyCompleted, got {other:?}"),
    }

    // The orphaned entry is left unposted and the case untouched.
    assert!(!fx.financial.journal_entry(entries[0].id).unwrap().posted);
    let untouched = fx.cases.get(case.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, CaseStatus::Active);
    assert_eq!(untouched.journal_entry_id, None);
}

#[tokio::test]
async fn finalize_case_update_failure_after_posting_reports_partial_completion() {
    let fx = fixture();
    let case = seed_case(&fx, ContractStatus::Active).await;
    fx.cases.fail_next_update();

    let err = fx
        .orchestrator
        .finalize_case(FinalizeCase {
            case_id: case.id,
            actor: "director@fh".to_string(),
        })
        .await
        .unwrap_err();

    let entries = fx.financial.created_journal_entries();
    assert_eq!(entries.len(), 1);
    match err {
        DomainError::PartiallyCompleted {
            journal_entry_id,
            description,
        } => {
            assert_eq!(journal_entry_id, Some(entries[0].id));
            assert!(description.contains("posted"));
        }
        other => panic!("expected PartiallyCompleted, got {other:?}"),
    }
    // Entry was posted; only the local link is missing.
    assert_eq!(fx.financial.posted_entry_ids(), vec![entries[0].id]);
    let untouched = fx.cases.get(case.id).await.unwrap().unwrap();
    assert_eq!(untouched.journal_entry_id, None);
}

#[tokio::test]
async fn convert_creates_case_contract_and_marks_lead() {
    let fx = fixture();
    let lead = qualified_lead();
    fx.leads.insert(lead.clone()).await.unwrap();

    let result = fx
        .orchestrator
        .convert_lead(ConvertLead {
            lead_id: lead.id,
            case_number: "FH-2026-0110".to_string(),
            decedent_name: "E. Whitfield".to_string(),
            actor: "counselor@fh".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(result.lead_id, lead.id);
    assert_eq!(result.total_amount, dec!(5000));

    let contracts = fx.financial.created_contracts();
    assert_eq!(contracts.len(), 1);
    assert_eq!(contracts[0].id, result.contract_id);
    assert_eq!(contracts[0].services.len(), 1);
    assert_eq!(contracts[0].products.len(), 1);
    assert_eq!(contracts[0].services[0].total, dec!(4200));

    let case = fx.cases.get(result.case_id).await.unwrap().unwrap();
    assert_eq!(case.contract_id, Some(result.contract_id));
    assert_eq!(case.funeral_home_id, lead.funeral_home_id);
    assert_eq!(case.status, CaseStatus::Active);

    let converted = fx.leads.get(lead.id).await.unwrap().unwrap();
    assert_eq!(converted.status, LeadStatus::Converted);
    assert_eq!(converted.converted_case_id, Some(result.case_id));
}

#[tokio::test]
async fn convert_rejects_unqualified_lead_without_creating_anything() {
    let fx = fixture();
    let mut lead = qualified_lead();
    lead.status = LeadStatus::Contacted;
    fx.leads.insert(lead.clone()).await.unwrap();

    let err = fx
        .orchestrator
        .convert_lead(ConvertLead {
            lead_id: lead.id,
            case_number: "FH-2026-0111".to_string(),
            decedent_name: "E. Whitfield".to_string(),
            actor: "counselor@fh".to_string(),
        })
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert!(fx.financial.created_contracts().is_empty());
    let untouched = fx.leads.get(lead.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, LeadStatus::Contacted);
}

#[tokio::test]
async fn convert_rejects_lead_without_line_items() {
    let fx = fixture();
    let mut lead = qualified_lead();
    lead.line_items.clear();
    fx.leads.insert(lead.clone()).await.unwrap();

    let err = fx
        .orchestrator
        .convert_lead(ConvertLead {
            lead_id: lead.id,
            case_number: "FH-2026-0112".to_string(),
            decedent_name: "E. Whitfield".to_string(),
            actor: "counselor@fh".to_string(),
        })
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert!(fx.financial.created_contracts().is_empty());
}

#[tokio::test]
async fn convert_remote_failure_reports_partial_completion() {
    let fx = fixture();
    let lead = qualified_lead();
    fx.leads.insert(lead.clone()).await.unwrap();
    fx.financial.fail_next_create_contract();

    let err = fx
        .orchestrator
        .convert_lead(ConvertLead {
            lead_id: lead.id,
            case_number: "FH-2026-0113".to_string(),
            decedent_name: "E. Whitfield".to_string(),
            actor: "counselor@fh".to_string(),
        })
        .await
        .unwrap_err();

    match err {
        DomainError::PartiallyCompleted { description, .. } => {
            assert!(description.contains("case"));
        }
        other => panic!("expected PartiallyCompleted, got {other:?}"),
    }
    // The lead stays qualified for a retry once the remote recovers.
    let untouched = fx.leads.get(lead.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, LeadStatus::Qualified);
}

#[tokio::test]
async fn custom_ar_account_is_used_for_the_debit_line() {
    let fx = fixture();
    fx.financial.seed_account(GlAccount {
        id: Uuid::new_v4(),
        number: "1250".to_string(),
        name: "Family receivable".to_string(),
    });
    let case = seed_case(&fx, ContractStatus::Active).await;

    let orchestrator = CaseOrchestrator::new(
        Arc::new(fx.cases.clone()),
        Arc::new(fx.leads.clone()),
        Arc::new(fx.financial.clone()),
    )
    .with_ar_account("1250");

    let result = orchestrator
        .finalize_case(FinalizeCase {
            case_id: case.id,
            actor: "director@fh".to_string(),
        })
        .await
        .unwrap();

    assert!(result.gl_accounts_posted.contains("1250"));
    let entry = &fx.financial.created_journal_entries()[0];
    assert_eq!(entry.lines[0].account_number, "1250");
}
