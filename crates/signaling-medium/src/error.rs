//! Signaling error types.

use crate::types::{NameHash, ParticipantId};
use thiserror::Error;

/// Failure category of a rejected call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request conflicts with the registry's uniqueness rules.
    Validation,
    /// The caller is not allowed to perform the call.
    Authorization,
    /// The addressed participant does not exist.
    TargetState,
    /// The request is well-formed but meaningless.
    Logic,
    /// The backing repository failed; nothing was committed.
    Storage,
}

/// Errors surfaced by registry and board operations.
///
/// Every variant aborts the call with no state change.
#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("Name already registered: {0}")]
    NameAlreadyRegistered(NameHash),

    #[error("Caller is not a participant: {0}")]
    CallerIsNotAParticipant(ParticipantId),

    #[error("Recipient is not a participant: {0}")]
    RecipientIsNotAParticipant(NameHash),

    #[error("Cannot connect to itself")]
    CannotConnectToItself,

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl SignalingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SignalingError::NameAlreadyRegistered(_) => ErrorKind::Validation,
            SignalingError::CallerIsNotAParticipant(_) => ErrorKind::Authorization,
            SignalingError::RecipientIsNotAParticipant(_) => ErrorKind::TargetState,
            SignalingError::CannotConnectToItself => ErrorKind::Logic,
            SignalingError::Repository(_) => ErrorKind::Storage,
        }
    }
}

/// Errors raised by a [`Repository`](crate::Repository) implementation.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sealing error: {0}")]
    Sealing(String),

    #[error("Repository unavailable: {0}")]
    Unavailable(String),

    #[error("Unsupported ledger version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Result type alias for signaling operations.
pub type Result<T, E = SignalingError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::hash_name;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            SignalingError::NameAlreadyRegistered(hash_name("juice")).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            SignalingError::CallerIsNotAParticipant("0xabc".into()).kind(),
            ErrorKind::Authorization
        );
        assert_eq!(
            SignalingError::RecipientIsNotAParticipant(hash_name("bee")).kind(),
            ErrorKind::TargetState
        );
        assert_eq!(
            SignalingError::CannotConnectToItself.kind(),
            ErrorKind::Logic
        );
        assert_eq!(
            SignalingError::from(RepositoryError::Unavailable("down".into())).kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn test_error_messages() {
        let err = SignalingError::CallerIsNotAParticipant("alice".into());
        assert_eq!(err.to_string(), "Caller is not a participant: alice");

        let err = SignalingError::NameAlreadyRegistered(crate::NameHash::ZERO);
        assert!(err.to_string().starts_with("Name already registered: 0x0000"));
    }
}
