//! Signaling relay - HTTP host for the signaling medium.
//!
//! The relay exposes the participant registry and the offer/answer board over
//! a small JSON API:
//! - Callers authenticate with a bearer secret; its SHA-256 is their identity
//! - Every accepted call is persisted to an AES-256-GCM sealed snapshot
//! - Committed transitions are streamed to observers over SSE

pub mod api;
pub mod config;
pub mod error;
pub mod store;

pub use config::Config;
pub use error::RelayError;
pub use store::{open_repository, EncryptedFileRepository};
