//! Signaling medium - pseudonymous participant registry and offer/answer board.
//!
//! Participants claim a SHA-256 name hash bound to their caller identity and
//! publish an encryption key. They then leave opaque handshake tokens for each
//! other: an initiator stores an offer addressed to a recipient's name hash,
//! and the recipient stores an answer back. Tokens are last-value slots; the
//! medium never interprets them and never connects peers itself.
//!
//! State changes go through [`SignalingMedium`], which runs each call as one
//! atomic transaction against a [`Repository`] and publishes an [`Event`] for
//! every committed transition.

mod board;
mod error;
mod events;
mod ledger;
mod medium;
mod registry;
mod repository;
mod types;

pub use board::{NegotiationState, PairMap, SignalingBoard};
pub use error::{ErrorKind, RepositoryError, Result, SignalingError};
pub use events::{Event, EventPayload};
pub use ledger::{Ledger, LEDGER_VERSION};
pub use medium::{MediumOptions, SignalingMedium, DEFAULT_EVENT_CAPACITY};
pub use registry::{IdentityRegistry, Participant, Registration, RegistryIntegrityError};
pub use repository::{MemoryRepository, Repository};
pub use types::{
    hash_name, EncryptionKey, NameHash, ParseHexError, ParticipantId, RequestContext, Token,
    NAME_HASH_LEN,
};
