//! API request and response types.

use serde::{Deserialize, Serialize};
use signaling_medium::{EncryptionKey, NameHash, NegotiationState, ParticipantId, Token};

/// Request to claim a name for the caller.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Plain-text name; only its hash is kept
    pub name: String,
    /// Hex-encoded encryption key (may be empty)
    #[serde(default)]
    pub encryption_key: String,
}

/// Response after registering.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: ParticipantId,
    pub name_hash: NameHash,
}

/// Participant lookup by id.
///
/// Unknown ids report the zero hash and an empty key.
#[derive(Debug, Serialize)]
pub struct ParticipantResponse {
    pub id: ParticipantId,
    pub is_participant: bool,
    pub name_hash: NameHash,
    pub encryption_key: EncryptionKey,
}

/// Name hash lookup.
#[derive(Debug, Serialize)]
pub struct NameResponse {
    pub name_hash: NameHash,
    pub is_participant: bool,
}

/// Request to leave an offer for a recipient.
#[derive(Debug, Deserialize)]
pub struct InitiateRequest {
    pub recipient_name_hash: String,
    pub token: String,
}

/// Request to leave an answer for an initiator.
#[derive(Debug, Deserialize)]
pub struct AcceptRequest {
    pub initiator_name_hash: String,
    pub token: String,
}

/// Stored offer slot; `token` is empty when nothing was left.
#[derive(Debug, Serialize)]
pub struct OfferResponse {
    pub recipient_name_hash: NameHash,
    pub initiator_name_hash: NameHash,
    pub token: Token,
}

/// Stored answer slot; `token` is empty when nothing was left.
#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub initiator_name_hash: NameHash,
    pub accepter_name_hash: NameHash,
    pub token: Token,
}

#[derive(Debug, Serialize)]
pub struct NegotiationResponse {
    pub initiator_name_hash: NameHash,
    pub accepter_name_hash: NameHash,
    pub state: NegotiationState,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub participant_count: usize,
}
