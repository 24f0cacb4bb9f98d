//! HTTP API for the signaling medium.

mod auth;
mod events;
mod handlers;
mod middleware;
mod types;

pub use auth::{participant_id_for_secret, Caller, MIN_SECRET_LEN};
pub use events::event_stream;
pub use handlers::*;
pub use middleware::{logging_middleware, rate_limit_middleware, RateLimitState};
pub use types::*;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use signaling_medium::SignalingMedium;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub medium: Arc<SignalingMedium>,
}

impl AppState {
    pub fn new(medium: SignalingMedium) -> Self {
        Self {
            medium: Arc::new(medium),
        }
    }
}

/// Create the API router with the default rate limit.
pub fn create_router(state: AppState) -> Router {
    create_router_with_rate_limit(state, RateLimitState::new(120))
}

/// Create the API router with custom rate limiting.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    let v1 = Router::new()
        .route("/participants", post(handlers::register))
        .route("/participants/:id", get(handlers::get_participant))
        .route("/names/:name_hash", get(handlers::get_name))
        .route("/offers", post(handlers::initiate_connection))
        .route("/offers/hash/:recipient/:initiator", get(handlers::get_offer))
        .route("/offers/id/:recipient/:initiator", get(handlers::get_offer_by_ids))
        .route("/answers", post(handlers::accept_connection))
        .route("/answers/hash/:initiator/:accepter", get(handlers::get_answer))
        .route("/answers/id/:initiator/:accepter", get(handlers::get_answer_by_ids))
        .route("/negotiations/:initiator/:accepter", get(handlers::get_negotiation))
        .route("/events", get(events::event_stream))
        .layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ));

    Router::new()
        // Health check (no rate limiting)
        .route("/health", get(handlers::health))
        .nest("/v1", v1)
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Allow cross-origin calls from browser peers.
pub fn with_cors(router: Router) -> Router {
    router.layer(CorsLayer::permissive())
}
