pub mod room;
pub mod signaling;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};

pub use room::{JoinOutcome, Occupant, RoomRegistry};
pub use signaling::{RelayService, ws_handler};

/// Relay router: one WebSocket endpoint, CORS open so the browser client
/// on another origin can reach it. Shared by the binary and the tests.
pub fn router(relay: RelayService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(relay)
}
