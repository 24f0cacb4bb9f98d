//! HTTP request handlers.

use super::auth::Caller;
use super::types::{
    AcceptRequest, AnswerResponse, HealthResponse, InitiateRequest, NameResponse,
    NegotiationResponse, OfferResponse, ParticipantResponse, RegisterRequest, RegisterResponse,
};
use super::AppState;
use crate::error::RelayError;
use axum::{
    extract::{Path, State},
    Json,
};
use signaling_medium::{EncryptionKey, NameHash, ParticipantId, Token};
use tracing::info;

fn parse_name_hash(field: &'static str, value: &str) -> Result<NameHash, RelayError> {
    value.parse().map_err(RelayError::invalid_hex(field))
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        participant_count: state.medium.participant_count().await,
    })
}

/// Claim a name for the caller, or refresh the caller's encryption key.
pub async fn register(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, RelayError> {
    let encryption_key: EncryptionKey = request
        .encryption_key
        .parse()
        .map_err(RelayError::invalid_hex("encryption_key"))?;

    let name_hash = state
        .medium
        .register(&ctx, &request.name, encryption_key)
        .await?;

    info!(caller = %ctx.caller(), %name_hash, "Participant registered");

    Ok(Json(RegisterResponse {
        id: ctx.caller().clone(),
        name_hash,
    }))
}

/// Look up a participant by id.
pub async fn get_participant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<ParticipantResponse> {
    let id = ParticipantId::new(id);
    let medium = &state.medium;

    Json(ParticipantResponse {
        is_participant: medium.is_participant_id(&id).await,
        name_hash: medium.name_hash_of(&id).await,
        encryption_key: medium.encryption_key_of(&id).await,
        id,
    })
}

/// Check whether a name hash is claimed.
pub async fn get_name(
    State(state): State<AppState>,
    Path(name_hash): Path<String>,
) -> Result<Json<NameResponse>, RelayError> {
    let name_hash = parse_name_hash("name_hash", &name_hash)?;

    Ok(Json(NameResponse {
        is_participant: state.medium.is_participant_name_hash(&name_hash).await,
        name_hash,
    }))
}

/// Leave an offer token for a recipient.
pub async fn initiate_connection(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Json(request): Json<InitiateRequest>,
) -> Result<Json<OfferResponse>, RelayError> {
    let recipient = parse_name_hash("recipient_name_hash", &request.recipient_name_hash)?;
    let token: Token = request
        .token
        .parse()
        .map_err(RelayError::invalid_hex("token"))?;

    let initiator = state
        .medium
        .initiate_connection(&ctx, recipient, token.clone())
        .await?;

    Ok(Json(OfferResponse {
        recipient_name_hash: recipient,
        initiator_name_hash: initiator,
        token,
    }))
}

/// Leave an answer token for an initiator.
pub async fn accept_connection(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Json(request): Json<AcceptRequest>,
) -> Result<Json<AnswerResponse>, RelayError> {
    let initiator = parse_name_hash("initiator_name_hash", &request.initiator_name_hash)?;
    let token: Token = request
        .token
        .parse()
        .map_err(RelayError::invalid_hex("token"))?;

    let accepter = state
        .medium
        .accept_connection(&ctx, initiator, token.clone())
        .await?;

    Ok(Json(AnswerResponse {
        initiator_name_hash: initiator,
        accepter_name_hash: accepter,
        token,
    }))
}

/// Read the offer slot addressed by name hashes.
pub async fn get_offer(
    State(state): State<AppState>,
    Path((recipient, initiator)): Path<(String, String)>,
) -> Result<Json<OfferResponse>, RelayError> {
    let recipient = parse_name_hash("recipient", &recipient)?;
    let initiator = parse_name_hash("initiator", &initiator)?;

    Ok(Json(OfferResponse {
        token: state.medium.offer_token(&recipient, &initiator).await,
        recipient_name_hash: recipient,
        initiator_name_hash: initiator,
    }))
}

/// Read the offer slot addressed by participant ids.
pub async fn get_offer_by_ids(
    State(state): State<AppState>,
    Path((recipient, initiator)): Path<(String, String)>,
) -> Json<OfferResponse> {
    let recipient = ParticipantId::new(recipient);
    let initiator = ParticipantId::new(initiator);
    let medium = &state.medium;

    Json(OfferResponse {
        recipient_name_hash: medium.name_hash_of(&recipient).await,
        initiator_name_hash: medium.name_hash_of(&initiator).await,
        token: medium.offer_token_by_ids(&recipient, &initiator).await,
    })
}

/// Read the answer slot addressed by name hashes.
pub async fn get_answer(
    State(state): State<AppState>,
    Path((initiator, accepter)): Path<(String, String)>,
) -> Result<Json<AnswerResponse>, RelayError> {
    let initiator = parse_name_hash("initiator", &initiator)?;
    let accepter = parse_name_hash("accepter", &accepter)?;

    Ok(Json(AnswerResponse {
        token: state.medium.answer_token(&initiator, &accepter).await,
        initiator_name_hash: initiator,
        accepter_name_hash: accepter,
    }))
}

/// Read the answer slot addressed by participant ids.
pub async fn get_answer_by_ids(
    State(state): State<AppState>,
    Path((initiator, accepter)): Path<(String, String)>,
) -> Json<AnswerResponse> {
    let initiator = ParticipantId::new(initiator);
    let accepter = ParticipantId::new(accepter);
    let medium = &state.medium;

    Json(AnswerResponse {
        initiator_name_hash: medium.name_hash_of(&initiator).await,
        accepter_name_hash: medium.name_hash_of(&accepter).await,
        token: medium.answer_token_by_ids(&initiator, &accepter).await,
    })
}

/// Report how far a pair got on the board.
pub async fn get_negotiation(
    State(state): State<AppState>,
    Path((initiator, accepter)): Path<(String, String)>,
) -> Result<Json<NegotiationResponse>, RelayError> {
    let initiator = parse_name_hash("initiator", &initiator)?;
    let accepter = parse_name_hash("accepter", &accepter)?;

    Ok(Json(NegotiationResponse {
        state: state.medium.negotiation_state(&initiator, &accepter).await,
        initiator_name_hash: initiator,
        accepter_name_hash: accepter,
    }))
}
