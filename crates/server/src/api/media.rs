use axum::{
    extract::{Path as AxumPath, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::state::AppState;
use crate::streaming::{file_response, image_response};
use crate::utils::{json_error_response, library_error, run_blocking};

pub async fn stream(
    State(state): State<AppState>,
    AxumPath(track_id): AxumPath<String>,
    headers: HeaderMap,
) -> Response {
    let library = state.library.clone();
    let lookup = match run_blocking(move || library.track_file(&track_id)).await {
        Ok(lookup) => lookup,
        Err(err) => return err.into_response(),
    };
    let path = match lookup {
        Ok(Some(path)) => path,
        Ok(None) => return json_error_response(StatusCode::NOT_FOUND, "track not found"),
        Err(err) => return library_error(err).into_response(),
    };
    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok());
    match file_response(&path, range).await {
        Ok(response) => response,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!("Indexed file is gone: {:?}", path);
            json_error_response(StatusCode::NOT_FOUND, "track file missing")
        }
        Err(err) => json_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to read track: {}", err),
        ),
    }
}

pub async fn art(
    State(state): State<AppState>,
    AxumPath(track_id): AxumPath<String>,
) -> Response {
    let path = state.library.artwork(&track_id);
    match tokio::fs::read(&path).await {
        Ok(bytes) => image_response(bytes, &path),
        Err(err) => {
            warn!("Artwork unavailable at {:?}: {}", path, err);
            json_error_response(StatusCode::NOT_FOUND, "artwork not found")
        }
    }
}
