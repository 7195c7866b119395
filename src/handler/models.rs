//! Model listing and deletion handlers

use crate::config::AppState;
use crate::error::ApiError;
use crate::http::{json_response, Envelope};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

/// `GET /models`: JSON array of stored model filenames
pub async fn list_models(state: &AppState) -> Result<Response<Full<Bytes>>, ApiError> {
    let models = state.store.list().await?;
    logger::log_debug(&format!("Listed {} models", models.len()));
    Ok(json_response(StatusCode::OK, &models))
}

/// `DELETE /models/{filename}`
pub async fn delete_model(
    state: &AppState,
    raw_name: &str,
) -> Result<Response<Full<Bytes>>, ApiError> {
    state.store.delete(raw_name).await?;
    logger::log_info(&format!("Deleted model '{raw_name}'"));
    Ok(json_response(
        StatusCode::OK,
        &Envelope::ok("Model deleted successfully"),
    ))
}
