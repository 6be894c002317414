use std::path::PathBuf;

use axum::http::StatusCode;
use axum::Json;
use library::Library;
use serde::{Deserialize, Serialize};

use crate::auth::Credentials;

#[derive(Clone)]
pub struct AppState {
    pub library: Library,
    pub music_root: Option<PathBuf>,
    pub credentials: Option<Credentials>,
}

/// Envelope every JSON payload is wrapped in.
#[derive(Debug, Serialize)]
pub struct MessageResponse<T> {
    pub message: T,
}

impl<T> MessageResponse<T> {
    pub fn new(message: T) -> Self {
        Self { message }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Deserialize)]
pub struct TrackQuery {
    pub search: Option<String>,
}

/// Raw pagination values; bad numbers fall back to defaults instead of
/// rejecting the request.
#[derive(Deserialize)]
pub struct PageQuery {
    pub skip: Option<String>,
    pub limit: Option<String>,
}

pub type JsonResult<T> = Result<Json<MessageResponse<T>>, (StatusCode, Json<ErrorResponse>)>;
