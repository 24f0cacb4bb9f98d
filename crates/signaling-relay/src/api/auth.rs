//! Bearer-secret caller authentication.

use crate::error::RelayError;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use sha2::{Digest, Sha256};
use signaling_medium::{ParticipantId, RequestContext};

/// Shortest secret accepted as a caller identity.
pub const MIN_SECRET_LEN: usize = 16;

/// Participant id owned by whoever holds `secret`.
pub fn participant_id_for_secret(secret: &str) -> ParticipantId {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    ParticipantId::new(hex::encode(hasher.finalize()))
}

/// Authenticated caller, extracted from `Authorization: Bearer <secret>`.
#[derive(Debug, Clone)]
pub struct Caller(pub RequestContext);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = RelayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(RelayError::Unauthenticated("missing Authorization header"))?;

        let secret = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(RelayError::Unauthenticated("expected a Bearer secret"))?;

        if secret.len() < MIN_SECRET_LEN {
            return Err(RelayError::Unauthenticated("secret is too short"));
        }

        Ok(Caller(RequestContext::new(participant_id_for_secret(secret))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<Caller, RelayError> {
        let mut builder = Request::builder().uri("/v1/offers");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Caller::from_request_parts(&mut parts, &()).await
    }

    #[test]
    fn test_participant_id_is_sha256_hex() {
        let id = participant_id_for_secret("");
        assert_eq!(
            id.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(
            participant_id_for_secret("alice-secret-0001"),
            participant_id_for_secret("alice-secret-0002")
        );
    }

    #[tokio::test]
    async fn test_bearer_secret_accepted() {
        let Caller(ctx) = extract(Some("Bearer alice-secret-0001")).await.unwrap();
        assert_eq!(ctx.caller(), &participant_id_for_secret("alice-secret-0001"));
    }

    #[tokio::test]
    async fn test_bad_headers_rejected() {
        for header in [None, Some("alice-secret-0001"), Some("Basic abc"), Some("Bearer short")] {
            assert!(matches!(
                extract(header).await,
                Err(RelayError::Unauthenticated(_))
            ));
        }
    }
}
