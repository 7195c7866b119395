//! Model upload handler
//!
//! `POST /uploads` with a `multipart/form-data` body carrying one `file` part.

use crate::config::AppState;
use crate::error::ApiError;
use crate::http::{json_response, Envelope};
use crate::logger;
use crate::storage::{ModelStore, PendingUpload};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use multer::{Field, Multipart};

/// Multipart field carrying the model
const FILE_FIELD: &str = "file";

/// Boundaries and part headers on top of the file bytes
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

const NO_FILE_MESSAGE: &str = "No file uploaded";

pub async fn handle_upload<B>(
    req: Request<B>,
    state: &AppState,
) -> Result<Response<Full<Bytes>>, ApiError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let store = &state.store;
    check_content_length(req.headers(), store.max_upload_size())?;

    // Anything that is not multipart simply has no file in it
    let Some(boundary) = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
    else {
        return Err(ApiError::validation(NO_FILE_MESSAGE));
    };

    let mut multipart = Multipart::new(req.into_body().into_data_stream(), boundary);
    let mut stored = None;

    if let Err(e) = receive_parts(&mut multipart, store, &mut stored).await {
        // A later malformed part invalidates an already committed file
        if let Some(name) = stored {
            discard_committed(store, &name).await;
        }
        return Err(e);
    }

    let filename = stored.ok_or_else(|| ApiError::validation(NO_FILE_MESSAGE))?;
    Ok(json_response(
        StatusCode::OK,
        &Envelope {
            filename: Some(&filename),
            ..Envelope::ok("File uploaded successfully")
        },
    ))
}

/// Reject early when the declared body cannot possibly fit
fn check_content_length(headers: &HeaderMap, max_upload_size: u64) -> Result<(), ApiError> {
    let Some(length) = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
    else {
        return Ok(());
    };

    if length > max_upload_size.saturating_add(MULTIPART_OVERHEAD) {
        logger::log_warning(&format!(
            "Upload body too large: {length} bytes (max file size: {max_upload_size})"
        ));
        return Err(ApiError::payload_too_large(max_upload_size));
    }
    Ok(())
}

/// Walk every part, storing the first `file` part that carries a filename
///
/// Other parts are drained and ignored.
async fn receive_parts(
    multipart: &mut Multipart<'static>,
    store: &ModelStore,
    stored: &mut Option<String>,
) -> Result<(), ApiError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let original = field.file_name().map(ToString::to_string);
        let wanted = stored.is_none() && field.name() == Some(FILE_FIELD);

        let Some(original) = original.filter(|_| wanted) else {
            drain(&mut field).await?;
            continue;
        };

        let mut pending = store.begin_upload(&original).await.map_err(|e| {
            logger::log_warning(&format!("Upload of '{original}' rejected: {e}"));
            ApiError::from(e)
        })?;

        if let Err(e) = copy_field(&mut field, &mut pending).await {
            pending.abort().await;
            return Err(e);
        }

        let size = pending.written();
        let name = pending.commit().await?;
        logger::log_info(&format!("Stored upload '{original}' as '{name}' ({size} bytes)"));
        *stored = Some(name);
    }
    Ok(())
}

async fn copy_field(
    field: &mut Field<'static>,
    pending: &mut PendingUpload,
) -> Result<(), ApiError> {
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if let Err(e) = pending.write_chunk(&chunk).await {
            logger::log_warning(&format!("Upload '{}' aborted: {e}", pending.filename()));
            return Err(e.into());
        }
    }
    Ok(())
}

async fn drain(field: &mut Field<'static>) -> Result<(), ApiError> {
    while field.chunk().await.map_err(multipart_error)?.is_some() {}
    Ok(())
}

async fn discard_committed(store: &ModelStore, name: &str) {
    if let Err(e) = store.delete(name).await {
        logger::log_error(&format!("Failed to discard upload '{name}': {e}"));
    }
}

/// Body read failures are ours to report, anything else is a bad request
fn multipart_error(e: multer::Error) -> ApiError {
    match e {
        multer::Error::StreamReadFailed(source) => {
            ApiError::Internal(format!("Failed to read request body: {source}"))
        }
        other => ApiError::validation(format!("Malformed multipart body: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    #[test]
    fn test_content_length_within_allowance() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from(1024 + 500_u64));
        assert!(check_content_length(&headers, 1024).is_ok());
    }

    #[test]
    fn test_content_length_over_allowance() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from(1024 + MULTIPART_OVERHEAD + 1));
        let err = check_content_length(&headers, 1024).unwrap_err();
        assert!(matches!(err, ApiError::PayloadTooLarge { .. }));
    }

    #[test]
    fn test_multipart_error_classification() {
        let read = multer::Error::StreamReadFailed(Box::new(std::io::Error::other("reset")));
        let err = multipart_error(read);
        assert!(matches!(err, ApiError::Internal(_)));
        assert!(err.status().is_server_error());

        let err = multipart_error(multer::Error::IncompleteStream);
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_missing_or_garbage_content_length_ignored() {
        let mut headers = HeaderMap::new();
        assert!(check_content_length(&headers, 1).is_ok());
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("lots"));
        assert!(check_content_length(&headers, 1).is_ok());
    }
}
