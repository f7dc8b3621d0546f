//! Invitation lifecycle over SCD2 versions
//!
//! An invitation invites a family member or staff contact into a case
//! portal. Its status never mutates in place: accept, revoke and resend
//! each write a new version of the invitation chain. Expiration is
//! derived at read time from `token_expires_at` and is never persisted;
//! only an explicit resend materializes a new version with a fresh token.

use crate::errors::{DomainError, DomainResult};
use crate::policy::{resolve_policy, InvitationPolicy};
use crate::repository::VersionedRepository;
use crate::state::{guard_transition, State};
use crate::versioned::{BusinessKey, Scoped, VersionedRecord};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Role an accepted invitation grants on the case portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvitationRole {
    /// Family member of the decedent
    FamilyMember,
    /// Funeral home staff
    Staff,
    /// Read-only guest
    Viewer,
}

/// Stored or derived status of an invitation
///
/// `Expired` is only ever derived from `token_expires_at`; it is never
/// written to a version row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvitationStatus {
    /// Awaiting a response
    Pending,
    /// Recipient accepted
    Accepted,
    /// Withdrawn by the funeral home
    Revoked,
    /// Token expiry has passed (derived, resend-only)
    Expired,
}

impl State for InvitationStatus {
    fn name(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "Pending",
            InvitationStatus::Accepted => "Accepted",
            InvitationStatus::Revoked => "Revoked",
            InvitationStatus::Expired => "Expired",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, InvitationStatus::Accepted | InvitationStatus::Revoked)
    }

    // Expired deliberately declares no transitions: leaving it goes
    // through resend, which writes a new Pending version rather than
    // transitioning the existing one.
    fn can_transition_to(&self, target: &Self) -> bool {
        use InvitationStatus::*;
        matches!((self, target), (Pending, Accepted) | (Pending, Revoked))
    }
}

/// Invitation payload carried by each SCD2 version row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    /// Recipient email address
    pub recipient_email: String,
    /// Recipient display name
    pub recipient_name: String,
    /// Role granted on acceptance
    pub role: InvitationRole,
    /// Opaque acceptance token, hex-encoded
    pub token: String,
    /// When the token stops being honored
    pub token_expires_at: DateTime<Utc>,
    /// Stored status; `Expired` never appears here
    pub status: InvitationStatus,
    /// Case the invitation belongs to
    pub case_id: Uuid,
    /// Owning funeral home
    pub funeral_home_id: Uuid,
    /// Who sent (or last resent) the invitation
    pub sent_by: String,
}

impl Scoped for Invitation {
    fn scope(&self) -> Uuid {
        self.funeral_home_id
    }
}

impl Invitation {
    /// Whether the invitation counts as expired at `now`
    ///
    /// Only a pending invitation can expire; terminal statuses keep their
    /// stored value regardless of the token window.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && now > self.token_expires_at
    }

    /// Status as observed at `now`, with expiration computed
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        if self.is_expired(now) {
            InvitationStatus::Expired
        } else {
            self.status
        }
    }
}

/// Source of cryptographically random invitation tokens
pub trait TokenGenerator: Send + Sync {
    /// Generate a hex-encoded token of `length_bytes` random bytes
    fn generate(&self, length_bytes: usize) -> String;
}

/// OS-randomness token generator used in production
#[derive(Clone, Copy, Default)]
pub struct OsRngTokenGenerator;

impl TokenGenerator for OsRngTokenGenerator {
    fn generate(&self, length_bytes: usize) -> String {
        let mut bytes = vec![0u8; length_bytes];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// Outbound notification dispatch
///
/// Best-effort from the invitation workflow's point of view: a failed
/// send is logged and never rolls back the version that triggered it.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send an email, returning the provider's message id
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> DomainResult<String>;
}

#[derive(Default)]
struct NotifierState {
    sent: Vec<(String, String, String)>,
    fail_next: bool,
}

/// In-memory notifier recording every send
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<RwLock<NotifierState>>,
}

impl RecordingNotifier {
    /// Create an empty notifier
    pub fn new() -> Self {
        Self::default()
    }

    /// Emails sent so far as `(to, subject, body)` tuples
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.state.read().map(|s| s.sent.clone()).unwrap_or_default()
    }

    /// Arm the notifier to fail the next send
    pub fn fail_next(&self) {
        if let Ok(mut state) = self.state.write() {
            state.fail_next = true;
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> DomainResult<String> {
        let mut state = self
            .state
            .write()
            .map_err(|_| DomainError::Email("notifier lock poisoned".to_string()))?;
        if state.fail_next {
            state.fail_next = false;
            return Err(DomainError::Email("smtp relay unavailable".to_string()));
        }
        state
            .sent
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(format!("msg-{}", state.sent.len()))
    }
}

/// Command to create an invitation
#[derive(Debug, Clone)]
pub struct CreateInvitation {
    /// Recipient email address
    pub recipient_email: String,
    /// Recipient display name
    pub recipient_name: String,
    /// Role granted on acceptance
    pub role: InvitationRole,
    /// Case the invitation belongs to
    pub case_id: Uuid,
    /// Owning funeral home
    pub funeral_home_id: Uuid,
    /// Sending actor
    pub sent_by: String,
}

/// Query for listing invitations
#[derive(Debug, Clone)]
pub struct ListInvitations {
    /// Mandatory funeral-home scope
    pub funeral_home_id: Uuid,
    /// Optional status filter, matched against the effective status
    pub status: Option<InvitationStatus>,
    /// Page size, 1-100
    pub limit: usize,
    /// Rows to skip
    pub offset: usize,
}

/// One row of a listing, with expiration recomputed
#[derive(Debug, Clone)]
pub struct InvitationListing {
    /// The current version row
    pub record: VersionedRecord<Invitation>,
    /// Status as observed at query time
    pub effective_status: InvitationStatus,
}

/// Invitation workflow service
///
/// Coordinates the invitation chain, the funeral home's invitation
/// policy, token generation and email dispatch.
pub struct InvitationService {
    invitations: Arc<dyn VersionedRepository<Invitation>>,
    policies: Arc<dyn VersionedRepository<InvitationPolicy>>,
    tokens: Arc<dyn TokenGenerator>,
    notifier: Arc<dyn Notifier>,
}

impl InvitationService {
    /// Assemble the service from its collaborators
    pub fn new(
        invitations: Arc<dyn VersionedRepository<Invitation>>,
        policies: Arc<dyn VersionedRepository<InvitationPolicy>>,
        tokens: Arc<dyn TokenGenerator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            invitations,
            policies,
            tokens,
            notifier,
        }
    }

    /// Create and send a new invitation (version 1)
    #[tracing::instrument(skip(self, cmd), fields(funeral_home_id = %cmd.funeral_home_id, case_id = %cmd.case_id))]
    pub async fn create(&self, cmd: CreateInvitation) -> DomainResult<VersionedRecord<Invitation>> {
        if cmd.recipient_email.trim().is_empty() {
            return Err(DomainError::Validation(
                "recipient email is required".to_string(),
            ));
        }
        let policy = resolve_policy::<InvitationPolicy, _>(
            self.policies.as_ref(),
            cmd.funeral_home_id,
        )
        .await?
        .payload;

        let now = Utc::now();
        let actor = cmd.sent_by.clone();
        let payload = Invitation {
            recipient_email: cmd.recipient_email,
            recipient_name: cmd.recipient_name,
            role: cmd.role,
            token: self.tokens.generate(policy.token_length_bytes),
            token_expires_at: now + Duration::days(policy.expiration_days),
            status: InvitationStatus::Pending,
            case_id: cmd.case_id,
            funeral_home_id: cmd.funeral_home_id,
            sent_by: cmd.sent_by,
        };
        let record = VersionedRecord::first(BusinessKey::new(), payload, actor);
        self.invitations.save(record.clone()).await?;

        self.dispatch_email(&record.payload).await;
        Ok(record)
    }

    /// Resend an invitation, minting a fresh token in a new version
    ///
    /// Allowed while the current version is pending or computed-expired.
    /// The precondition recomputes expiration from `token_expires_at`;
    /// `Expired` is never read from storage because it is never written.
    #[tracing::instrument(skip(self), fields(business_key = %business_key))]
    pub async fn resend(
        &self,
        business_key: BusinessKey<Invitation>,
        actor: impl Into<String> + std::fmt::Debug,
    ) -> DomainResult<VersionedRecord<Invitation>> {
        let actor: String = actor.into();
        let current = self.load_current(business_key).await?;
        let stored = current.payload.status;
        if stored != InvitationStatus::Pending {
            return Err(DomainError::InvalidStateTransition {
                from: stored.name().to_string(),
                to: InvitationStatus::Pending.name().to_string(),
            });
        }

        let policy = resolve_policy::<InvitationPolicy, _>(
            self.policies.as_ref(),
            current.payload.funeral_home_id,
        )
        .await?
        .payload;

        let now = Utc::now();
        let mut payload = current.payload.clone();
        payload.token = self.tokens.generate(policy.token_length_bytes);
        payload.token_expires_at = now + Duration::days(policy.expiration_days);
        payload.status = InvitationStatus::Pending;
        payload.sent_by = actor.clone();

        let next = current.next(payload, actor, Some("resend".to_string()));
        self.invitations.save(next.clone()).await?;

        self.dispatch_email(&next.payload).await;
        Ok(next)
    }

    /// Accept a pending invitation in a new version
    pub async fn accept(
        &self,
        business_key: BusinessKey<Invitation>,
        actor: impl Into<String>,
    ) -> DomainResult<VersionedRecord<Invitation>> {
        self.transition(business_key, InvitationStatus::Accepted, actor.into())
            .await
    }

    /// Revoke a pending invitation in a new version
    pub async fn revoke(
        &self,
        business_key: BusinessKey<Invitation>,
        actor: impl Into<String>,
    ) -> DomainResult<VersionedRecord<Invitation>> {
        self.transition(business_key, InvitationStatus::Revoked, actor.into())
            .await
    }

    /// List current invitations for a funeral home
    ///
    /// Expiration is recomputed per row; the optional status filter
    /// matches the effective status, so filtering on `Expired` returns
    /// pending rows whose token window has passed.
    pub async fn list(&self, query: ListInvitations) -> DomainResult<Vec<InvitationListing>> {
        if query.funeral_home_id.is_nil() {
            return Err(DomainError::Validation(
                "funeral home scope is required".to_string(),
            ));
        }
        if query.limit == 0 || query.limit > 100 {
            return Err(DomainError::Validation(format!(
                "limit must be 1-100, got {}",
                query.limit
            )));
        }

        let now = Utc::now();
        let rows = self.invitations.list_current(query.funeral_home_id).await?;
        Ok(rows
            .into_iter()
            .map(|record| {
                let effective_status = record.payload.effective_status(now);
                InvitationListing {
                    record,
                    effective_status,
                }
            })
            .filter(|listing| {
                query
                    .status
                    .map(|wanted| listing.effective_status == wanted)
                    .unwrap_or(true)
            })
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn transition(
        &self,
        business_key: BusinessKey<Invitation>,
        target: InvitationStatus,
        actor: String,
    ) -> DomainResult<VersionedRecord<Invitation>> {
        let current = self.load_current(business_key).await?;
        // Computed-expired invitations cannot be accepted or revoked,
        // only resent; guard against the effective status, not the
        // stored one.
        let effective = current.payload.effective_status(Utc::now());
        let next_status = guard_transition(&effective, target)?;

        let mut payload = current.payload.clone();
        payload.status = next_status;
        let next = current.next(payload, actor, Some(next_status.name().to_string()));
        self.invitations.save(next.clone()).await?;
        Ok(next)
    }

    async fn load_current(
        &self,
        business_key: BusinessKey<Invitation>,
    ) -> DomainResult<VersionedRecord<Invitation>> {
        self.invitations
            .find_current_by_key(business_key)
            .await?
            .ok_or_else(|| DomainError::not_found("Invitation", business_key))
    }

    // Fire-and-forget: a failed send must not roll back the version that
    // was already committed.
    async fn dispatch_email(&self, invitation: &Invitation) {
        let subject = format!(
            "You're invited to the {} family portal",
            invitation.recipient_name
        );
        let body = format!(
            "Hello {},\n\nUse token {} to join the case portal. \
             The link expires on {}.",
            invitation.recipient_name,
            invitation.token,
            invitation.token_expires_at.format("%Y-%m-%d"),
        );
        if let Err(err) = self
            .notifier
            .send_email(&invitation.recipient_email, &subject, &body)
            .await
        {
            tracing::warn!(
                recipient = %invitation.recipient_email,
                error = %err,
                "invitation email failed; version already committed"
            );
        }
    }
}

/// Deterministic token generator for tests
#[derive(Clone, Default)]
pub struct SequenceTokenGenerator {
    counter: Arc<RwLock<u64>>,
}

impl SequenceTokenGenerator {
    /// Create a generator starting at token 1
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenGenerator for SequenceTokenGenerator {
    fn generate(&self, length_bytes: usize) -> String {
        let mut counter = match self.counter.write() {
            Ok(c) => c,
            Err(poisoned) => poisoned.into_inner(),
        };
        *counter += 1;
        let mut bytes = vec![0u8; length_bytes];
        bytes[..8.min(length_bytes)]
            .copy_from_slice(&counter.to_be_bytes()[..8.min(length_bytes)]);
        hex::encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryVersionedRepository;
    use pretty_assertions::assert_eq;

    fn policy_repo(scope: Uuid) -> Arc<InMemoryVersionedRepository<InvitationPolicy>> {
        let repo = Arc::new(InMemoryVersionedRepository::new("InvitationPolicy"));
        let record = VersionedRecord::first(
            BusinessKey::new(),
            InvitationPolicy {
                funeral_home_id: scope,
                token_length_bytes: 32,
                expiration_days: 7,
            },
            "admin",
        );
        futures::executor::block_on(repo.save(record)).unwrap();
        repo
    }

    struct Fixture {
        service: InvitationService,
        invitations: Arc<InMemoryVersionedRepository<Invitation>>,
        notifier: RecordingNotifier,
        scope: Uuid,
    }

    fn fixture() -> Fixture {
        let scope = Uuid::new_v4();
        let invitations = Arc::new(InMemoryVersionedRepository::new("Invitation"));
        let notifier = RecordingNotifier::new();
        let service = InvitationService::new(
            invitations.clone(),
            policy_repo(scope),
            Arc::new(OsRngTokenGenerator),
            Arc::new(notifier.clone()),
        );
        Fixture {
            service,
            invitations,
            notifier,
            scope,
        }
    }

    fn create_cmd(scope: Uuid) -> CreateInvitation {
        CreateInvitation {
            recipient_email: "family@example.com".to_string(),
            recipient_name: "A. Family".to_string(),
            role: InvitationRole::FamilyMember,
            case_id: Uuid::new_v4(),
            funeral_home_id: scope,
            sent_by: "director@fh".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_uses_policy_token_length_and_expiry() {
        let fx = fixture();
        let record = fx.service.create(create_cmd(fx.scope)).await.unwrap();

        assert_eq!(record.version, 1);
        assert_eq!(record.payload.status, InvitationStatus::Pending);
        // 32 bytes hex-encoded.
        assert_eq!(record.payload.token.len(), 64);
        let days_out = record.payload.token_expires_at - Utc::now();
        assert!(days_out > Duration::days(6) && days_out <= Duration::days(7));

        let sent = fx.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "family@example.com");
        assert!(sent[0].2.contains(&record.payload.token));
    }

    #[tokio::test]
    async fn test_create_without_policy_is_not_found() {
        let fx = fixture();
        let mut cmd = create_cmd(fx.scope);
        cmd.funeral_home_id = Uuid::new_v4(); // unprovisioned scope
        let err = fx.service.create(cmd).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_expiration_is_computed_not_stored() {
        let fx = fixture();
        let record = fx.service.create(create_cmd(fx.scope)).await.unwrap();

        let past = Utc::now() - Duration::days(1);
        let mut expired = record.payload.clone();
        expired.token_expires_at = past;

        assert!(expired.is_expired(Utc::now()));
        assert_eq!(expired.effective_status(Utc::now()), InvitationStatus::Expired);
        // Stored status remains Pending; nothing was written back.
        assert_eq!(expired.status, InvitationStatus::Pending);
    }

    #[tokio::test]
    async fn test_resend_writes_new_version_preserving_provenance() {
        let fx = fixture();
        let v1 = fx.service.create(create_cmd(fx.scope)).await.unwrap();

        let v2 = fx
            .service
            .resend(v1.business_key, "manager@fh")
            .await
            .unwrap();

        assert_eq!(v2.version, 2);
        assert_eq!(v2.business_key, v1.business_key);
        assert_eq!(v2.created_at, v1.created_at);
        assert_eq!(v2.payload.status, InvitationStatus::Pending);
        assert_ne!(v2.payload.token, v1.payload.token);
        assert_eq!(v2.payload.sent_by, "manager@fh");

        let history = fx.invitations.get_history(v1.business_key).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(!history[1].is_current);
        assert!(history[0].is_current);

        // Both the create and the resend dispatched email.
        assert_eq!(fx.notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_resend_allowed_on_computed_expired() {
        let fx = fixture();
        let v1 = fx.service.create(create_cmd(fx.scope)).await.unwrap();

        // Force the current version past its window without writing a
        // status change: expiry stays derived.
        let mut expired_payload = v1.payload.clone();
        expired_payload.token_expires_at = Utc::now() - Duration::days(2);
        let aged = v1.next(expired_payload, "director@fh", None);
        fx.invitations.save(aged.clone()).await.unwrap();
        assert_eq!(
            aged.payload.effective_status(Utc::now()),
            InvitationStatus::Expired
        );

        let resent = fx
            .service
            .resend(v1.business_key, "director@fh")
            .await
            .unwrap();
        assert_eq!(resent.version, 3);
        assert!(resent.payload.token_expires_at > Utc::now());
    }

    #[tokio::test]
    async fn test_resend_rejected_after_terminal_status() {
        let fx = fixture();
        let v1 = fx.service.create(create_cmd(fx.scope)).await.unwrap();
        fx.service.accept(v1.business_key, "family").await.unwrap();

        let err = fx
            .service
            .resend(v1.business_key, "director@fh")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidStateTransition { ref from, .. } if from == "Accepted"
        ));
    }

    #[tokio::test]
    async fn test_accept_and_revoke_write_terminal_versions() {
        let fx = fixture();
        let a = fx.service.create(create_cmd(fx.scope)).await.unwrap();
        let b = fx.service.create(create_cmd(fx.scope)).await.unwrap();

        let accepted = fx.service.accept(a.business_key, "family").await.unwrap();
        assert_eq!(accepted.payload.status, InvitationStatus::Accepted);
        assert_eq!(accepted.version, 2);

        let revoked = fx.service.revoke(b.business_key, "director").await.unwrap();
        assert_eq!(revoked.payload.status, InvitationStatus::Revoked);

        // Terminal statuses cannot move again.
        assert!(fx.service.revoke(a.business_key, "director").await.is_err());
        assert!(fx.service.accept(b.business_key, "family").await.is_err());
    }

    #[tokio::test]
    async fn test_computed_expired_cannot_be_accepted_or_revoked() {
        let fx = fixture();
        let v1 = fx.service.create(create_cmd(fx.scope)).await.unwrap();
        let mut expired_payload = v1.payload.clone();
        expired_payload.token_expires_at = Utc::now() - Duration::hours(1);
        fx.invitations
            .save(v1.next(expired_payload, "director@fh", None))
            .await
            .unwrap();

        let err = fx.service.accept(v1.business_key, "family").await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidStateTransition { ref from, .. } if from == "Expired"
        ));
        let err = fx.service.revoke(v1.business_key, "director").await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidStateTransition { ref from, .. } if from == "Expired"
        ));
    }

    #[tokio::test]
    async fn test_email_failure_does_not_roll_back_version() {
        let fx = fixture();
        fx.notifier.fail_next();

        let record = fx.service.create(create_cmd(fx.scope)).await.unwrap();
        // Version committed despite the failed send.
        let current = fx
            .invitations
            .find_current_by_key(record.business_key)
            .await
            .unwrap();
        assert!(current.is_some());
        assert!(fx.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_by_effective_status_and_paginates() {
        let fx = fixture();
        let fresh = fx.service.create(create_cmd(fx.scope)).await.unwrap();
        let stale = fx.service.create(create_cmd(fx.scope)).await.unwrap();
        let done = fx.service.create(create_cmd(fx.scope)).await.unwrap();

        // Age one invitation past its window, accept another.
        let mut aged = stale.payload.clone();
        aged.token_expires_at = Utc::now() - Duration::days(1);
        fx.invitations
            .save(stale.next(aged, "director@fh", None))
            .await
            .unwrap();
        fx.service.accept(done.business_key, "family").await.unwrap();

        let all = fx
            .service
            .list(ListInvitations {
                funeral_home_id: fx.scope,
                status: None,
                limit: 10,
                offset: 0,
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let expired_only = fx
            .service
            .list(ListInvitations {
                funeral_home_id: fx.scope,
                status: Some(InvitationStatus::Expired),
                limit: 10,
                offset: 0,
            })
            .await
            .unwrap();
        assert_eq!(expired_only.len(), 1);
        assert_eq!(
            expired_only[0].record.business_key,
            stale.business_key
        );
        // The stored status on the expired row is still Pending.
        assert_eq!(
            expired_only[0].record.payload.status,
            InvitationStatus::Pending
        );

        let pending_only = fx
            .service
            .list(ListInvitations {
                funeral_home_id: fx.scope,
                status: Some(InvitationStatus::Pending),
                limit: 10,
                offset: 0,
            })
            .await
            .unwrap();
        assert_eq!(pending_only.len(), 1);
        assert_eq!(pending_only[0].record.business_key, fresh.business_key);

        let page = fx
            .service
            .list(ListInvitations {
                funeral_home_id: fx.scope,
                status: None,
                limit: 2,
                offset: 2,
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn test_list_requires_scope_and_sane_limit() {
        let fx = fixture();
        let err = fx
            .service
            .list(ListInvitations {
                funeral_home_id: Uuid::nil(),
                status: None,
                limit: 10,
                offset: 0,
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = fx
            .service
            .list(ListInvitations {
                funeral_home_id: fx.scope,
                status: None,
                limit: 0,
                offset: 0,
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_os_rng_tokens_are_unique_and_sized() {
        let gen = OsRngTokenGenerator;
        let a = gen.generate(16);
        let b = gen.generate(16);
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_sequence_generator_is_deterministic() {
        let gen = SequenceTokenGenerator::new();
        let a = gen.generate(16);
        let b = gen.generate(16);
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.starts_with("0000000000000001"));
        assert!(b.starts_with("0000000000000002"));
    }
}
