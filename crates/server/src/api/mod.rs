pub mod library;
pub mod media;

use axum::{middleware, routing::get, Router};

use crate::auth::require_basic_auth;
use crate::state::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/sync", get(library::sync))
        .route("/info", get(library::get_info))
        .route("/tracks", get(library::tracks))
        .route("/playlists", get(library::playlists))
        .route("/favourite/:track_id", get(library::favourite))
        .route("/favourites", get(library::favourites))
        .route("/stream/:track_id", get(media::stream))
        .route("/art/:track_id", get(media::art))
        .layer(middleware::from_fn_with_state(state.clone(), require_basic_auth))
        .with_state(state)
}
