//! Offer/answer board for pairwise connection signaling.

use crate::error::{Result, SignalingError};
use crate::registry::IdentityRegistry;
use crate::types::{NameHash, ParticipantId, RequestContext, Token};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Token slots keyed by an ordered pair of name hashes.
///
/// `(a, b)` and `(b, a)` are independent slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairMap(HashMap<NameHash, HashMap<NameHash, Token>>);

impl PairMap {
    pub fn get(&self, first: &NameHash, second: &NameHash) -> Option<&Token> {
        self.0.get(first).and_then(|inner| inner.get(second))
    }

    /// Store a token, returning the one it replaced.
    pub fn insert(&mut self, first: NameHash, second: NameHash, token: Token) -> Option<Token> {
        self.0.entry(first).or_default().insert(second, token)
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.0.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Where a negotiation from an initiator to an accepter stands.
///
/// There is no "connected" state: the transport handshake happens off-board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationState {
    NoRequest,
    Requested,
    Answered,
}

/// Last-value offer and answer slots between participants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalingBoard {
    /// `(recipient, initiator) -> offer`
    offers: PairMap,
    /// `(initiator, accepter) -> answer`
    answers: PairMap,
}

impl SignalingBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the caller's name hash and check it may address `target`.
    ///
    /// Guard order: caller registered, target registered, target is not the caller.
    fn authorize(
        registry: &IdentityRegistry,
        ctx: &RequestContext,
        target: &NameHash,
    ) -> Result<NameHash> {
        let caller = ctx.caller();
        if !registry.is_participant_id(caller) {
            return Err(SignalingError::CallerIsNotAParticipant(caller.clone()));
        }
        if !registry.is_participant_name_hash(target) {
            return Err(SignalingError::RecipientIsNotAParticipant(*target));
        }
        let caller_hash = registry.name_hash_of(caller);
        if caller_hash == *target {
            return Err(SignalingError::CannotConnectToItself);
        }
        Ok(caller_hash)
    }

    /// Leave an offer for `recipient`, overwriting any earlier offer from the caller.
    ///
    /// Returns the caller's name hash.
    pub fn initiate_connection(
        &mut self,
        registry: &IdentityRegistry,
        ctx: &RequestContext,
        recipient: NameHash,
        token: Token,
    ) -> Result<NameHash> {
        let initiator = Self::authorize(registry, ctx, &recipient)?;
        self.offers.insert(recipient, initiator, token);
        Ok(initiator)
    }

    /// Answer an offer from `initiator`, overwriting any earlier answer from the caller.
    ///
    /// An offer does not need to exist; returns the caller's name hash.
    pub fn accept_connection(
        &mut self,
        registry: &IdentityRegistry,
        ctx: &RequestContext,
        initiator: NameHash,
        token: Token,
    ) -> Result<NameHash> {
        let accepter = Self::authorize(registry, ctx, &initiator)?;
        self.answers.insert(initiator, accepter, token);
        Ok(accepter)
    }

    /// Offer left by `initiator` for `recipient`, empty if none.
    pub fn offer_token(&self, recipient: &NameHash, initiator: &NameHash) -> Token {
        self.offers
            .get(recipient, initiator)
            .cloned()
            .unwrap_or_default()
    }

    pub fn offer_token_by_ids(
        &self,
        registry: &IdentityRegistry,
        recipient: &ParticipantId,
        initiator: &ParticipantId,
    ) -> Token {
        self.offer_token(
            &registry.name_hash_of(recipient),
            &registry.name_hash_of(initiator),
        )
    }

    /// Answer left by `accepter` for `initiator`, empty if none.
    pub fn answer_token(&self, initiator: &NameHash, accepter: &NameHash) -> Token {
        self.answers
            .get(initiator, accepter)
            .cloned()
            .unwrap_or_default()
    }

    pub fn answer_token_by_ids(
        &self,
        registry: &IdentityRegistry,
        initiator: &ParticipantId,
        accepter: &ParticipantId,
    ) -> Token {
        self.answer_token(
            &registry.name_hash_of(initiator),
            &registry.name_hash_of(accepter),
        )
    }

    /// State of the negotiation `initiator -> accepter`.
    pub fn negotiation_state(&self, initiator: &NameHash, accepter: &NameHash) -> NegotiationState {
        if self.answers.get(initiator, accepter).is_some() {
            NegotiationState::Answered
        } else if self.offers.get(accepter, initiator).is_some() {
            NegotiationState::Requested
        } else {
            NegotiationState::NoRequest
        }
    }

    pub fn offer_count(&self) -> usize {
        self.offers.len()
    }

    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }
}
