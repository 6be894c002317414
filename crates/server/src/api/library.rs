use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
};
use common::{Album, Summary, Track};
use ::library::PageParams;
use tracing::{debug, error, info};

use crate::state::{AppState, JsonResult, PageQuery, TrackQuery};
use crate::utils::{json_error, json_message, library_error, run_blocking};

/// Full rescan of the configured music root.
pub async fn sync(State(state): State<AppState>) -> JsonResult<Vec<Album>> {
    let root = match state.music_root.clone() {
        Some(root) => root,
        None => {
            return Err(json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "music_root must be set",
            ))
        }
    };
    let library = state.library.clone();
    let result = tokio::task::spawn_blocking(move || library.sync(&root)).await;
    match result {
        Ok(Ok(report)) => {
            info!(
                "Sync complete: {} tracks, {} albums, {} skipped",
                report.tracks,
                report.albums.len(),
                report.skipped
            );
            Ok(json_message(report.albums))
        }
        Ok(Err(err)) => {
            error!("Sync failed: {}", err);
            Err(library_error(err))
        }
        Err(err) => {
            error!("Sync task failed: {}", err);
            Err(json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "sync task failed",
            ))
        }
    }
}

pub async fn get_info(State(state): State<AppState>) -> JsonResult<Summary> {
    let library = state.library.clone();
    run_blocking(move || library.summary())
        .await?
        .map(json_message)
        .map_err(library_error)
}

pub async fn tracks(
    State(state): State<AppState>,
    Query(query): Query<TrackQuery>,
) -> JsonResult<Vec<Track>> {
    let library = state.library.clone();
    let tracks = run_blocking(move || library.list_tracks(query.search.as_deref())).await?;
    Ok(json_message(tracks))
}

pub async fn playlists(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> JsonResult<Vec<Album>> {
    let page = PageParams::from_raw(query.skip.as_deref(), query.limit.as_deref());
    let library = state.library.clone();
    let albums = run_blocking(move || library.list_albums(page)).await?;
    Ok(json_message(albums))
}

/// Unknown identities are acknowledged like known ones.
pub async fn favourite(
    State(state): State<AppState>,
    AxumPath(track_id): AxumPath<String>,
) -> JsonResult<bool> {
    let library = state.library.clone();
    let id = track_id.clone();
    match run_blocking(move || library.toggle_favorite(&id)).await? {
        Ok(Some(now)) => debug!("Track {} favourite={}", track_id, now),
        Ok(None) => debug!("Favourite toggle for unknown track {}", track_id),
        Err(err) => return Err(library_error(err)),
    }
    Ok(json_message(true))
}

pub async fn favourites(State(state): State<AppState>) -> JsonResult<Vec<Track>> {
    let library = state.library.clone();
    run_blocking(move || library.favorites())
        .await?
        .map(json_message)
        .map_err(library_error)
}
