//! The shared store: registry and board as one persisted snapshot.

use crate::board::SignalingBoard;
use crate::error::{RepositoryError, Result};
use crate::events::{Event, EventPayload};
use crate::registry::{IdentityRegistry, Participant, Registration};
use chrono::Utc;
use crate::types::{hash_name, EncryptionKey, NameHash, ParticipantId, RequestContext, Token};
use serde::{Deserialize, Serialize};

/// Snapshot schema version.
pub const LEDGER_VERSION: u32 = 1;

/// Complete signaling state.
///
/// Mutating methods either apply fully and return the event describing the
/// transition, or fail without touching `self`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub version: u32,
    registry: IdentityRegistry,
    board: SignalingBoard,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            version: LEDGER_VERSION,
            registry: IdentityRegistry::new(),
            board: SignalingBoard::new(),
        }
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh ledger with `operator` holding the empty name.
    ///
    /// Reserves `hash("")` until the operator registers a real name, which
    /// releases it like any other rename.
    pub fn with_operator(operator: ParticipantId) -> Self {
        let now = Utc::now();
        Self {
            registry: IdentityRegistry::with_participant(Participant {
                id: operator,
                name_hash: hash_name(""),
                encryption_key: EncryptionKey::empty(),
                registered_at: now,
                updated_at: now,
            }),
            ..Self::new()
        }
    }

    /// Reject snapshots written by a different schema version.
    pub fn check_version(&self) -> std::result::Result<(), RepositoryError> {
        if self.version != LEDGER_VERSION {
            return Err(RepositoryError::UnsupportedVersion {
                found: self.version,
                supported: LEDGER_VERSION,
            });
        }
        Ok(())
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn board(&self) -> &SignalingBoard {
        &self.board
    }

    pub fn register(
        &mut self,
        ctx: &RequestContext,
        name: &str,
        encryption_key: EncryptionKey,
    ) -> Result<Event> {
        let outcome = self.registry.register(ctx, name, encryption_key)?;
        let id = ctx.caller().clone();
        let name_hash = self.registry.name_hash_of(&id);
        let payload = match outcome {
            Registration::Created => EventPayload::ParticipantRegistered { id, name_hash },
            Registration::KeyUpdated => EventPayload::EncryptionKeyUpdated { id, name_hash },
            Registration::Renamed { previous } => EventPayload::ParticipantRenamed {
                id,
                previous,
                name_hash,
            },
        };
        Ok(Event::now(payload))
    }

    pub fn initiate_connection(
        &mut self,
        ctx: &RequestContext,
        recipient: NameHash,
        token: Token,
    ) -> Result<Event> {
        let initiator = self
            .board
            .initiate_connection(&self.registry, ctx, recipient, token)?;
        Ok(Event::now(EventPayload::ConnectionInitiated {
            recipient,
            initiator,
        }))
    }

    pub fn accept_connection(
        &mut self,
        ctx: &RequestContext,
        initiator: NameHash,
        token: Token,
    ) -> Result<Event> {
        let accepter = self
            .board
            .accept_connection(&self.registry, ctx, initiator, token)?;
        Ok(Event::now(EventPayload::ConnectionAccepted {
            initiator,
            accepter,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignalingError;

    #[test]
    fn test_register_events() {
        let mut ledger = Ledger::new();
        let alice = RequestContext::new("alice");

        let event = ledger
            .register(&alice, "risenow", EncryptionKey::from(&[1u8][..]))
            .unwrap();
        assert_eq!(
            event.payload,
            EventPayload::ParticipantRegistered {
                id: "alice".into(),
                name_hash: hash_name("risenow"),
            }
        );

        let event = ledger
            .register(&alice, "risenow", EncryptionKey::from(&[2u8][..]))
            .unwrap();
        assert_eq!(
            event.payload,
            EventPayload::EncryptionKeyUpdated {
                id: "alice".into(),
                name_hash: hash_name("risenow"),
            }
        );
    }

    #[test]
    fn test_failed_call_leaves_ledger_unchanged() {
        let mut ledger = Ledger::new();
        ledger
            .register(&RequestContext::new("alice"), "risenow", EncryptionKey::empty())
            .unwrap();
        let before = ledger.clone();

        let err = ledger
            .initiate_connection(
                &RequestContext::new("alice"),
                hash_name("risenow"),
                Token::new(vec![0xaa]),
            )
            .unwrap_err();

        assert!(matches!(err, SignalingError::CannotConnectToItself));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_operator_reserves_empty_name() {
        let mut ledger = Ledger::with_operator("operator".into());

        assert!(ledger.registry().is_participant_id(&"operator".into()));
        assert_eq!(
            ledger.registry().name_hash_of(&"operator".into()),
            hash_name("")
        );

        let err = ledger
            .register(&RequestContext::new("mallory"), "", EncryptionKey::empty())
            .unwrap_err();
        assert!(matches!(err, SignalingError::NameAlreadyRegistered(_)));
    }

    #[test]
    fn test_operator_can_take_a_real_name() {
        let mut ledger = Ledger::with_operator("operator".into());
        let operator = RequestContext::new("operator");
        let bob = RequestContext::new("bob");

        let event = ledger
            .register(&operator, "risenow", EncryptionKey::empty())
            .unwrap();
        assert_eq!(
            event.payload,
            EventPayload::ParticipantRenamed {
                id: "operator".into(),
                previous: hash_name(""),
                name_hash: hash_name("risenow"),
            }
        );
        assert_eq!(
            ledger.registry().name_hash_of(operator.caller()),
            hash_name("risenow")
        );
        assert!(!ledger.registry().is_participant_name_hash(&hash_name("")));

        ledger.register(&bob, "juice", EncryptionKey::empty()).unwrap();
        ledger
            .initiate_connection(&bob, hash_name("risenow"), Token::new(vec![0xaa]))
            .unwrap();
        let event = ledger
            .accept_connection(&operator, hash_name("juice"), Token::new(vec![0xbb]))
            .unwrap();

        assert_eq!(
            event.payload,
            EventPayload::ConnectionAccepted {
                initiator: hash_name("juice"),
                accepter: hash_name("risenow"),
            }
        );
        assert_eq!(
            ledger.board().offer_token_by_ids(ledger.registry(), operator.caller(), bob.caller()),
            Token::new(vec![0xaa])
        );
    }

    #[test]
    fn test_check_version() {
        let mut ledger = Ledger::new();
        assert!(ledger.check_version().is_ok());

        ledger.version = LEDGER_VERSION + 1;
        assert!(matches!(
            ledger.check_version(),
            Err(RepositoryError::UnsupportedVersion { found, supported })
                if found == LEDGER_VERSION + 1 && supported == LEDGER_VERSION
        ));
    }

    #[test]
    fn test_ledger_serialization() {
        let mut ledger = Ledger::new();
        let alice = RequestContext::new("alice");
        let bob = RequestContext::new("bob");
        ledger.register(&alice, "risenow", EncryptionKey::empty()).unwrap();
        ledger.register(&bob, "juice", EncryptionKey::empty()).unwrap();
        ledger
            .initiate_connection(&alice, hash_name("juice"), Token::new(vec![0xaa]))
            .unwrap();

        let json = serde_json::to_vec(&ledger).unwrap();
        let restored: Ledger = serde_json::from_slice(&json).unwrap();

        assert_eq!(restored, ledger);
        assert_eq!(restored.version, LEDGER_VERSION);
    }
}
