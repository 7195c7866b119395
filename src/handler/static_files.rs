//! Static model serving module
//!
//! `GET /uploads/{filename}` returns stored bytes as-is, with validators and
//! single-range support. Misses are plain 404s, not JSON.

use crate::error::ApiError;
use crate::handler::router::RequestContext;
use crate::http::response::{build_file_response, build_partial_response, FileValidators};
use crate::http::{self, cache, mime, RangeParseResult};
use crate::logger;
use crate::storage::{naming, ModelStore, StorageError};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Serve one stored file by its raw URL path segment
pub async fn serve_model(
    ctx: &RequestContext,
    store: &ModelStore,
    raw_name: &str,
) -> Result<Response<Full<Bytes>>, ApiError> {
    logger::log_debug(&format!("Serving static file '{raw_name}'"));
    let model = match store.read(raw_name).await {
        Ok(m) => m,
        Err(StorageError::NotFound(_)) => return Ok(http::build_404_response()),
        Err(StorageError::InvalidName(name)) => {
            logger::log_warning(&format!("Rejected static path segment: {name}"));
            return Ok(http::build_404_response());
        }
        Err(e) => return Err(e.into()),
    };

    let ext = naming::extension_of(&model.name);
    let content_type = mime::get_content_type(ext.as_deref());
    let total_size = model.data.len();
    let etag = cache::generate_etag(
        u64::try_from(total_size).unwrap_or(u64::MAX),
        model.modified,
    );

    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        return Ok(http::build_304_response(&etag));
    }

    let last_modified = model.modified.map(cache::format_http_date);
    let validators = FileValidators {
        content_type,
        etag: &etag,
        last_modified: last_modified.as_deref(),
    };
    let data = Bytes::from(model.data);

    let response = match http::parse_range_header(ctx.range_header.as_deref(), total_size) {
        RangeParseResult::Valid(range) => build_partial_response(
            data.slice(range.start..=range.end),
            &validators,
            range.start,
            range.end,
            total_size,
            ctx.is_head,
        ),
        RangeParseResult::NotSatisfiable => http::build_416_response(total_size),
        RangeParseResult::None => build_file_response(data, &validators, ctx.is_head),
    };
    Ok(response)
}
