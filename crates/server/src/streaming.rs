use std::io::SeekFrom;
use std::path::Path;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Inclusive byte window of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// Not a single `bytes=` range; the header is ignored.
    Malformed,
    /// Well formed but outside the file; answered with 416.
    Unsatisfiable,
}

pub fn parse_range(value: &str, size: u64) -> Result<ByteRange, RangeError> {
    let ranges = value
        .trim()
        .strip_prefix("bytes=")
        .ok_or(RangeError::Malformed)?;
    if ranges.contains(',') {
        return Err(RangeError::Malformed);
    }
    let (first, last) = ranges.split_once('-').ok_or(RangeError::Malformed)?;
    let (first, last) = (first.trim(), last.trim());
    let number = |text: &str| text.parse::<u64>().map_err(|_| RangeError::Malformed);

    if first.is_empty() {
        let suffix = number(last)?;
        if suffix == 0 || size == 0 {
            return Err(RangeError::Unsatisfiable);
        }
        return Ok(ByteRange {
            start: size.saturating_sub(suffix),
            end: size - 1,
        });
    }

    let start = number(first)?;
    let end = if last.is_empty() {
        None
    } else {
        Some(number(last)?)
    };
    if matches!(end, Some(end) if end < start) {
        return Err(RangeError::Malformed);
    }
    if start >= size {
        return Err(RangeError::Unsatisfiable);
    }
    Ok(ByteRange {
        start,
        end: end.map_or(size - 1, |end| end.min(size - 1)),
    })
}

/// Serves a file from disk, honouring a single `Range` request.
pub async fn file_response(path: &Path, range: Option<&str>) -> std::io::Result<Response> {
    let mut file = tokio::fs::File::open(path).await?;
    let size = file.metadata().await?.len();
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    let window = match range.map(|value| parse_range(value, size)) {
        Some(Ok(window)) => Some(window),
        Some(Err(RangeError::Unsatisfiable)) => {
            return Ok(unsatisfiable(size));
        }
        Some(Err(RangeError::Malformed)) | None => None,
    };

    let (status, start, len) = match window {
        Some(window) => (StatusCode::PARTIAL_CONTENT, window.start, window.len()),
        None => (StatusCode::OK, 0, size),
    };
    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }
    debug!("Serving {:?} bytes {}+{} of {}", path, start, len, size);

    let body = Body::from_stream(ReaderStream::new(file.take(len)));
    let mut response = Response::new(body);
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Some(window) = window {
        if let Ok(value) =
            HeaderValue::from_str(&format!("bytes {}-{}/{}", window.start, window.end, size))
        {
            headers.insert(header::CONTENT_RANGE, value);
        }
    }
    Ok(response)
}

/// Artwork files carry no extension, so the type is sniffed from the bytes.
pub fn image_response(data: Vec<u8>, fallback: &Path) -> Response {
    let mime = metadata::guess_mime(&data)
        .map(str::to_string)
        .unwrap_or_else(|| {
            mime_guess::from_path(fallback)
                .first_or_octet_stream()
                .to_string()
        });
    let mut response = Response::new(Body::from(data));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&mime)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    response
}

fn unsatisfiable(size: u64) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::RANGE_NOT_SATISFIABLE;
    if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", size)) {
        response.headers_mut().insert(header::CONTENT_RANGE, value);
    }
    response
}
