//! Identity registry binding caller identities to name hashes.

use crate::error::{Result, SignalingError};
use crate::types::{hash_name, EncryptionKey, NameHash, ParticipantId, RequestContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// A registered participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Authenticated identity that owns the name hash
    pub id: ParticipantId,

    /// SHA-256 of the chosen name
    pub name_hash: NameHash,

    /// Latest published encryption key
    pub encryption_key: EncryptionKey,

    /// When the name was first claimed
    pub registered_at: DateTime<Utc>,

    /// When the encryption key was last written
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The caller claimed a new name.
    Created,
    /// The caller re-registered its own name; only the key changed.
    KeyUpdated,
    /// The caller moved to a new name; `previous` is free again.
    Renamed { previous: NameHash },
}

/// Integrity violation found while rebuilding a registry from a snapshot.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryIntegrityError {
    #[error("Name hash {name_hash} is bound to both {first} and {second}")]
    DuplicateNameHash {
        name_hash: NameHash,
        first: ParticipantId,
        second: ParticipantId,
    },

    #[error("Participant {0} is listed more than once")]
    DuplicateParticipant(ParticipantId),
}

/// Bidirectional `id <-> name hash` registry.
///
/// Both indexes are only touched together, so a name hash maps to at most
/// one id and an id to at most one name hash. Serialized as the list of
/// participants; the name index is rebuilt (and checked) on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Participant>", into = "Vec<Participant>")]
pub struct IdentityRegistry {
    participants: HashMap<ParticipantId, Participant>,
    names: HashMap<NameHash, ParticipantId>,
}

impl IdentityRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `hash(name)` for the caller and publish `encryption_key`.
    ///
    /// Re-registering the caller's own name overwrites the key. Registering a
    /// different name releases the caller's previous one.
    pub fn register(
        &mut self,
        ctx: &RequestContext,
        name: &str,
        encryption_key: EncryptionKey,
    ) -> Result<Registration> {
        self.bind(ctx.caller(), hash_name(name), encryption_key)
    }

    /// Registry holding a single participant.
    pub(crate) fn with_participant(participant: Participant) -> Self {
        let mut registry = Self::new();
        registry
            .names
            .insert(participant.name_hash, participant.id.clone());
        registry
            .participants
            .insert(participant.id.clone(), participant);
        registry
    }

    /// Bind an already-hashed name to `id`.
    pub fn bind(
        &mut self,
        id: &ParticipantId,
        name_hash: NameHash,
        encryption_key: EncryptionKey,
    ) -> Result<Registration> {
        if let Some(owner) = self.names.get(&name_hash) {
            if owner != id {
                return Err(SignalingError::NameAlreadyRegistered(name_hash));
            }
        }

        let now = Utc::now();
        match self.participants.get_mut(id) {
            Some(existing) if existing.name_hash != name_hash => {
                let previous = existing.name_hash;
                self.names.remove(&previous);
                self.names.insert(name_hash, id.clone());
                existing.name_hash = name_hash;
                existing.encryption_key = encryption_key;
                existing.updated_at = now;
                Ok(Registration::Renamed { previous })
            }
            Some(existing) => {
                existing.encryption_key = encryption_key;
                existing.updated_at = now;
                Ok(Registration::KeyUpdated)
            }
            None => {
                self.names.insert(name_hash, id.clone());
                self.participants.insert(
                    id.clone(),
                    Participant {
                        id: id.clone(),
                        name_hash,
                        encryption_key,
                        registered_at: now,
                        updated_at: now,
                    },
                );
                Ok(Registration::Created)
            }
        }
    }

    /// Get a participant by id.
    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    /// Resolve the id that owns a name hash.
    pub fn id_of(&self, name_hash: &NameHash) -> Option<&ParticipantId> {
        self.names.get(name_hash)
    }

    pub fn is_participant_id(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    pub fn is_participant_name_hash(&self, name_hash: &NameHash) -> bool {
        self.names.contains_key(name_hash)
    }

    /// Name hash bound to `id`, or [`NameHash::ZERO`] if unregistered.
    pub fn name_hash_of(&self, id: &ParticipantId) -> NameHash {
        self.participants
            .get(id)
            .map(|p| p.name_hash)
            .unwrap_or(NameHash::ZERO)
    }

    /// Encryption key of `id`, or an empty key if unregistered.
    pub fn encryption_key_of(&self, id: &ParticipantId) -> EncryptionKey {
        self.participants
            .get(id)
            .map(|p| p.encryption_key.clone())
            .unwrap_or_default()
    }

    /// Number of registered participants.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

impl TryFrom<Vec<Participant>> for IdentityRegistry {
    type Error = RegistryIntegrityError;

    fn try_from(list: Vec<Participant>) -> std::result::Result<Self, Self::Error> {
        let mut registry = IdentityRegistry::new();
        for participant in list {
            if registry.participants.contains_key(&participant.id) {
                return Err(RegistryIntegrityError::DuplicateParticipant(participant.id));
            }
            if let Some(first) = registry.names.get(&participant.name_hash) {
                return Err(RegistryIntegrityError::DuplicateNameHash {
                    name_hash: participant.name_hash,
                    first: first.clone(),
                    second: participant.id,
                });
            }
            registry
                .names
                .insert(participant.name_hash, participant.id.clone());
            registry
                .participants
                .insert(participant.id.clone(), participant);
        }
        Ok(registry)
    }
}

impl From<IdentityRegistry> for Vec<Participant> {
    fn from(registry: IdentityRegistry) -> Self {
        let mut list: Vec<Participant> = registry.participants.into_values().collect();
        list.sort_by(|a, b| a.registered_at.cmp(&b.registered_at).then(a.id.cmp(&b.id)));
        list
    }
}
