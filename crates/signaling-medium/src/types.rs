//! Identifiers and opaque payloads exchanged through the medium.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of a name hash in bytes (SHA-256 output).
pub const NAME_HASH_LEN: usize = 32;

/// Error returned when parsing a hex-encoded value.
#[derive(Debug, Error, PartialEq)]
pub enum ParseHexError {
    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Authenticated identity of a caller, supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// SHA-256 of a human-chosen name; the public handle of a participant.
///
/// The all-zero value is never produced by [`hash_name`] in practice and
/// stands for "no name" in non-failing lookups.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NameHash([u8; NAME_HASH_LEN]);

impl NameHash {
    pub const ZERO: NameHash = NameHash([0u8; NAME_HASH_LEN]);

    pub const fn from_bytes(bytes: [u8; NAME_HASH_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; NAME_HASH_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; NAME_HASH_LEN]
    }
}

impl fmt::Display for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameHash({})", self)
    }
}

impl FromStr for NameHash {
    type Err = ParseHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(strip_hex_prefix(s))?;
        let actual = bytes.len();
        let array: [u8; NAME_HASH_LEN] =
            bytes.try_into().map_err(|_| ParseHexError::InvalidLength {
                expected: NAME_HASH_LEN,
                actual,
            })?;
        Ok(Self(array))
    }
}

impl Serialize for NameHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NameHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Hash a human-readable name into its public handle.
///
/// Only the hash is ever stored; the name itself never leaves the caller.
pub fn hash_name(name: &str) -> NameHash {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    NameHash(hasher.finalize().into())
}

/// Defines a newtype over opaque bytes rendered as `0x`-prefixed hex.
macro_rules! opaque_bytes {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Default)]
        pub struct $name(Vec<u8>);

        impl $name {
            pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
                Self(bytes.into())
            }

            /// The empty value returned by lookups that found nothing.
            pub fn empty() -> Self {
                Self(Vec::new())
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn into_bytes(self) -> Vec<u8> {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(&self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = ParseHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(hex::decode(strip_hex_prefix(s))?))
            }
        }

        impl From<Vec<u8>> for $name {
            fn from(bytes: Vec<u8>) -> Self {
                Self(bytes)
            }
        }

        impl From<&[u8]> for $name {
            fn from(bytes: &[u8]) -> Self {
                Self(bytes.to_vec())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

opaque_bytes!(
    /// Public-key material a participant publishes for others to encrypt to.
    EncryptionKey
);

opaque_bytes!(
    /// Opaque signaling payload, e.g. a serialized connection offer or answer.
    Token
);

/// Per-call context supplied by the host: who is making this call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    caller: ParticipantId,
}

impl RequestContext {
    pub fn new(caller: impl Into<ParticipantId>) -> Self {
        Self {
            caller: caller.into(),
        }
    }

    pub fn caller(&self) -> &ParticipantId {
        &self.caller
    }
}
