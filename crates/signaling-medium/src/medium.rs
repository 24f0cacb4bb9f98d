//! Transactional façade: the operation surface exposed to hosts.

use crate::board::NegotiationState;
use crate::error::Result;
use crate::events::Event;
use crate::ledger::Ledger;
use crate::repository::Repository;
use crate::types::{EncryptionKey, NameHash, ParticipantId, RequestContext, Token};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, instrument, warn};

/// Default size of the event broadcast buffer.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Options for [`SignalingMedium::open`].
#[derive(Debug, Clone)]
pub struct MediumOptions {
    /// Events buffered per subscriber before slow subscribers start lagging
    pub event_capacity: usize,

    /// Identity registered under the empty name when a new ledger is created
    pub operator: Option<ParticipantId>,
}

impl Default for MediumOptions {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            operator: None,
        }
    }
}

/// Registry and board behind a single write lock.
///
/// Each mutating call runs guards and mutation on a staged copy of the
/// ledger, persists the copy, then commits it. Calls are totally ordered by
/// the lock, and a failed call leaves the visible state untouched.
pub struct SignalingMedium {
    ledger: RwLock<Ledger>,
    repository: Arc<dyn Repository>,
    events: broadcast::Sender<Event>,
}

impl SignalingMedium {
    /// Load the ledger from `repository`, creating and saving a new one if
    /// nothing was stored yet.
    pub async fn open(repository: Arc<dyn Repository>, options: MediumOptions) -> Result<Self> {
        let ledger = match repository.load().await? {
            Some(ledger) => {
                ledger.check_version()?;
                info!(
                    participants = ledger.registry().len(),
                    offers = ledger.board().offer_count(),
                    answers = ledger.board().answer_count(),
                    "Loaded ledger"
                );
                ledger
            }
            None => {
                let ledger = match options.operator.clone() {
                    Some(operator) => {
                        info!(%operator, "Creating ledger with operator identity");
                        Ledger::with_operator(operator)
                    }
                    None => {
                        info!("Creating empty ledger");
                        Ledger::new()
                    }
                };
                repository.save(&ledger).await?;
                ledger
            }
        };

        Ok(Self::with_ledger(ledger, repository, options.event_capacity))
    }

    /// Wrap an already loaded ledger.
    pub fn with_ledger(
        ledger: Ledger,
        repository: Arc<dyn Repository>,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            ledger: RwLock::new(ledger),
            repository,
            events,
        }
    }

    /// Subscribe to events of transitions committed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    async fn transact<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Ledger) -> Result<(Event, T)>,
    {
        let mut ledger = self.ledger.write().await;
        let mut staged = ledger.clone();

        let (event, output) = match op(&mut staged) {
            Ok(applied) => applied,
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "Call rejected");
                return Err(e);
            }
        };

        if let Err(e) = self.repository.save(&staged).await {
            warn!(error = %e, "Failed to persist ledger, transition discarded");
            return Err(e.into());
        }

        *ledger = staged;
        debug!(event = event.name(), "Transition committed");

        // No subscribers is not an error.
        let _ = self.events.send(event);
        Ok(output)
    }

    /// Claim `hash(name)` for the caller and publish an encryption key.
    ///
    /// Returns the caller's name hash after the call.
    #[instrument(skip(self, ctx, name, encryption_key), fields(caller = %ctx.caller()))]
    pub async fn register(
        &self,
        ctx: &RequestContext,
        name: &str,
        encryption_key: EncryptionKey,
    ) -> Result<NameHash> {
        let name_hash = self
            .transact(|ledger| {
                let event = ledger.register(ctx, name, encryption_key)?;
                Ok((event, ledger.registry().name_hash_of(ctx.caller())))
            })
            .await?;
        info!(%name_hash, "Registration committed");
        Ok(name_hash)
    }

    /// Leave `token` as an offer for the participant behind `recipient`.
    ///
    /// Returns the name hash the offer was filed under as initiator.
    #[instrument(skip(self, ctx, token), fields(caller = %ctx.caller()))]
    pub async fn initiate_connection(
        &self,
        ctx: &RequestContext,
        recipient: NameHash,
        token: Token,
    ) -> Result<NameHash> {
        let initiator = self
            .transact(|ledger| {
                let event = ledger.initiate_connection(ctx, recipient, token)?;
                Ok((event, ledger.registry().name_hash_of(ctx.caller())))
            })
            .await?;
        info!(%initiator, "Offer stored");
        Ok(initiator)
    }

    /// Leave `token` as an answer for the participant behind `initiator`.
    ///
    /// Returns the name hash the answer was filed under as accepter.
    #[instrument(skip(self, ctx, token), fields(caller = %ctx.caller()))]
    pub async fn accept_connection(
        &self,
        ctx: &RequestContext,
        initiator: NameHash,
        token: Token,
    ) -> Result<NameHash> {
        let accepter = self
            .transact(|ledger| {
                let event = ledger.accept_connection(ctx, initiator, token)?;
                Ok((event, ledger.registry().name_hash_of(ctx.caller())))
            })
            .await?;
        info!(%accepter, "Answer stored");
        Ok(accepter)
    }

    pub async fn is_participant_id(&self, id: &ParticipantId) -> bool {
        self.ledger.read().await.registry().is_participant_id(id)
    }

    pub async fn is_participant_name_hash(&self, name_hash: &NameHash) -> bool {
        self.ledger
            .read()
            .await
            .registry()
            .is_participant_name_hash(name_hash)
    }

    pub async fn name_hash_of(&self, id: &ParticipantId) -> NameHash {
        self.ledger.read().await.registry().name_hash_of(id)
    }

    pub async fn encryption_key_of(&self, id: &ParticipantId) -> EncryptionKey {
        self.ledger.read().await.registry().encryption_key_of(id)
    }

    pub async fn offer_token(&self, recipient: &NameHash, initiator: &NameHash) -> Token {
        self.ledger.read().await.board().offer_token(recipient, initiator)
    }

    pub async fn offer_token_by_ids(
        &self,
        recipient: &ParticipantId,
        initiator: &ParticipantId,
    ) -> Token {
        let ledger = self.ledger.read().await;
        ledger
            .board()
            .offer_token_by_ids(ledger.registry(), recipient, initiator)
    }

    pub async fn answer_token(&self, initiator: &NameHash, accepter: &NameHash) -> Token {
        self.ledger.read().await.board().answer_token(initiator, accepter)
    }

    pub async fn answer_token_by_ids(
        &self,
        initiator: &ParticipantId,
        accepter: &ParticipantId,
    ) -> Token {
        let ledger = self.ledger.read().await;
        ledger
            .board()
            .answer_token_by_ids(ledger.registry(), initiator, accepter)
    }

    pub async fn negotiation_state(
        &self,
        initiator: &NameHash,
        accepter: &NameHash,
    ) -> NegotiationState {
        self.ledger
            .read()
            .await
            .board()
            .negotiation_state(initiator, accepter)
    }

    /// Number of registered participants.
    pub async fn participant_count(&self) -> usize {
        self.ledger.read().await.registry().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RepositoryError, SignalingError};
    use crate::repository::{MemoryRepository, MockRepository};
    use crate::types::hash_name;

    fn token(s: &str) -> Token {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_and_saves_ledger() {
        let repository = Arc::new(MemoryRepository::new());
        let medium = SignalingMedium::open(repository.clone(), MediumOptions::default())
            .await
            .unwrap();

        assert_eq!(medium.participant_count().await, 0);
        assert_eq!(repository.snapshot().await, Some(Ledger::new()));
    }

    #[tokio::test]
    async fn test_open_with_operator() {
        let repository = Arc::new(MemoryRepository::new());
        let options = MediumOptions {
            operator: Some("operator".into()),
            ..MediumOptions::default()
        };
        let medium = SignalingMedium::open(repository, options).await.unwrap();

        assert!(medium.is_participant_id(&"operator".into()).await);
        assert!(medium.is_participant_name_hash(&hash_name("")).await);
    }

    #[tokio::test]
    async fn test_open_existing_ledger_ignores_operator() {
        let mut ledger = Ledger::new();
        ledger
            .register(&RequestContext::new("alice"), "risenow", EncryptionKey::empty())
            .unwrap();
        let repository = Arc::new(MemoryRepository::with_ledger(ledger));
        let options = MediumOptions {
            operator: Some("operator".into()),
            ..MediumOptions::default()
        };

        let medium = SignalingMedium::open(repository, options).await.unwrap();

        assert!(medium.is_participant_id(&"alice".into()).await);
        assert!(!medium.is_participant_id(&"operator".into()).await);
    }

    #[tokio::test]
    async fn test_open_rejects_unknown_ledger_version() {
        let mut ledger = Ledger::new();
        ledger.version = crate::ledger::LEDGER_VERSION + 1;
        let mut repository = MockRepository::new();
        repository
            .expect_load()
            .returning(move || Ok(Some(ledger.clone())));
        repository.expect_save().never();

        let result = SignalingMedium::open(Arc::new(repository), MediumOptions::default()).await;

        assert!(matches!(
            result,
            Err(SignalingError::Repository(RepositoryError::UnsupportedVersion { .. }))
        ));
    }

    #[tokio::test]
    async fn test_mutations_return_callers_current_name_hash() {
        let medium = SignalingMedium::open(
            Arc::new(MemoryRepository::new()),
            MediumOptions {
                operator: Some("operator".into()),
                ..MediumOptions::default()
            },
        )
        .await
        .unwrap();
        let operator = RequestContext::new("operator");
        let bob = RequestContext::new("bob");
        let mut events = medium.subscribe();

        let renamed = medium
            .register(&operator, "risenow", EncryptionKey::empty())
            .await
            .unwrap();
        medium.register(&bob, "juice", EncryptionKey::empty()).await.unwrap();
        let initiator = medium
            .initiate_connection(&operator, hash_name("juice"), token("0xaa"))
            .await
            .unwrap();
        let accepter = medium
            .accept_connection(&bob, hash_name("risenow"), token("0xbb"))
            .await
            .unwrap();

        assert_eq!(renamed, hash_name("risenow"));
        assert_eq!(initiator, hash_name("risenow"));
        assert_eq!(accepter, hash_name("juice"));
        assert_eq!(
            medium.offer_token(&hash_name("juice"), &hash_name("risenow")).await,
            token("0xaa")
        );
        assert_eq!(events.recv().await.unwrap().name(), "participant_renamed");
    }

    #[tokio::test]
    async fn test_open_propagates_load_failure() {
        let mut repository = MockRepository::new();
        repository
            .expect_load()
            .returning(|| Err(RepositoryError::Unavailable("disk gone".into())));

        let result = SignalingMedium::open(Arc::new(repository), MediumOptions::default()).await;

        assert!(matches!(result, Err(SignalingError::Repository(_))));
    }

    #[tokio::test]
    async fn test_failed_save_discards_transition() {
        let mut repository = MockRepository::new();
        repository
            .expect_save()
            .times(1)
            .returning(|_| Err(RepositoryError::Unavailable("disk full".into())));
        let medium = SignalingMedium::with_ledger(Ledger::new(), Arc::new(repository), 16);
        let mut events = medium.subscribe();

        let err = medium
            .register(&RequestContext::new("alice"), "risenow", EncryptionKey::empty())
            .await
            .unwrap_err();

        assert!(matches!(err, SignalingError::Repository(_)));
        assert!(!medium.is_participant_id(&"alice".into()).await);
        assert!(!medium.is_participant_name_hash(&hash_name("risenow")).await);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rejected_call_does_not_save() {
        let mut repository = MockRepository::new();
        repository.expect_save().never();
        let medium = SignalingMedium::with_ledger(Ledger::new(), Arc::new(repository), 16);

        let err = medium
            .initiate_connection(
                &RequestContext::new("stranger"),
                hash_name("juice"),
                token("0xaa"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SignalingError::CallerIsNotAParticipant(_)));
    }

    #[tokio::test]
    async fn test_committed_transitions_are_published() {
        let medium = SignalingMedium::with_ledger(
            Ledger::new(),
            Arc::new(MemoryRepository::new()),
            16,
        );
        let mut events = medium.subscribe();
        let alice = RequestContext::new("alice");
        let bob = RequestContext::new("bob");

        medium.register(&alice, "risenow", EncryptionKey::empty()).await.unwrap();
        medium.register(&bob, "juice", EncryptionKey::empty()).await.unwrap();
        medium
            .initiate_connection(&alice, hash_name("juice"), token("0xaa"))
            .await
            .unwrap();

        assert_eq!(events.recv().await.unwrap().name(), "participant_registered");
        assert_eq!(events.recv().await.unwrap().name(), "participant_registered");
        assert_eq!(events.recv().await.unwrap().name(), "connection_initiated");
    }

    #[tokio::test]
    async fn test_transitions_are_persisted() {
        let repository = Arc::new(MemoryRepository::new());
        let medium = SignalingMedium::with_ledger(Ledger::new(), repository.clone(), 16);
        let alice = RequestContext::new("alice");
        let bob = RequestContext::new("bob");

        medium.register(&alice, "risenow", EncryptionKey::empty()).await.unwrap();
        medium.register(&bob, "juice", EncryptionKey::empty()).await.unwrap();
        medium
            .accept_connection(&bob, hash_name("risenow"), token("0xbb"))
            .await
            .unwrap();

        let saved = repository.snapshot().await.unwrap();
        assert_eq!(
            saved.board().answer_token(&hash_name("risenow"), &hash_name("juice")),
            token("0xbb")
        );
    }
}
