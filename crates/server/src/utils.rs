use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use library::LibraryError;
use tracing::error;

use crate::state::{ErrorResponse, MessageResponse};

pub fn json_error(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn json_error_response(status: StatusCode, message: impl Into<String>) -> Response {
    json_error(status, message).into_response()
}

pub fn json_message<T>(message: T) -> Json<MessageResponse<T>> {
    Json(MessageResponse::new(message))
}

/// Missing collections mean nothing has been synced yet.
pub fn library_error(err: LibraryError) -> (StatusCode, Json<ErrorResponse>) {
    if err.is_not_found() {
        json_error(StatusCode::NOT_FOUND, format!("library not synced: {}", err))
    } else {
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("library error: {}", err),
        )
    }
}

/// Runs store and filesystem work on the blocking pool. Library calls may
/// wait on the writer lock for a whole sync.
pub async fn run_blocking<T, F>(task: F) -> Result<T, (StatusCode, Json<ErrorResponse>)>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.map_err(|err| {
        error!("Blocking task failed: {}", err);
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "background task failed")
    })
}
