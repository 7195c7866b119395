//! HTTP response building module
//!
//! Builders for the JSON envelopes of the model API and the plain responses
//! of static file serving.

use crate::error::ApiError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// JSON envelope shared by every non-listing API response
#[derive(Debug, Serialize)]
pub struct Envelope<'a> {
    pub success: bool,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<&'a str>,
}

impl<'a> Envelope<'a> {
    pub const fn ok(message: &'a str) -> Self {
        Self {
            success: true,
            message,
            filename: None,
        }
    }

    pub const fn failure(message: &'a str) -> Self {
        Self {
            success: false,
            message,
            filename: None,
        }
    }
}

/// Build JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from_static(
                    br#"{"success":false,"message":"Something went wrong!"}"#,
                )))
                .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Error"))));
        }
    };

    let content_length = json.len();
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Content-Length", content_length)
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::from("Error")))
        })
}

/// Build the JSON error envelope for an `ApiError`
pub fn build_error_response(err: &ApiError) -> Response<Full<Bytes>> {
    let message = err.message();
    let mut resp = json_response(err.status(), &Envelope::failure(&message));
    if let ApiError::MethodNotAllowed { allow } = err {
        resp.headers_mut()
            .insert("Allow", hyper::header::HeaderValue::from_static(*allow));
    }
    resp
}

/// Build 204 No Content response (preflight)
pub fn build_no_content_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("204", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header("ETag", etag)
        .header("Cache-Control", "no-cache")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build plain 404 Not Found response for static files
pub fn build_404_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from_static(b"404 Not Found")))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from_static(b"404 Not Found")))
        })
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: usize) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header("Content-Type", "text/plain")
        .header("Content-Range", format!("bytes */{file_size}"))
        .body(Full::new(Bytes::from_static(b"Range Not Satisfiable")))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(Full::new(Bytes::from_static(b"Range Not Satisfiable")))
        })
}

/// Validators attached to a served file
pub struct FileValidators<'a> {
    pub content_type: &'a str,
    pub etag: &'a str,
    pub last_modified: Option<&'a str>,
}

/// Build 200 response for a whole file
///
/// `Content-Length` always reflects the file, HEAD just drops the body.
pub fn build_file_response(
    data: Bytes,
    file: &FileValidators<'_>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", file.content_type)
        .header("Content-Length", content_length)
        .header("Accept-Ranges", "bytes")
        .header("ETag", file.etag)
        .header("Cache-Control", "no-cache");
    if let Some(last_modified) = file.last_modified {
        builder = builder.header("Last-Modified", last_modified);
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("200", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 206 Partial Content response for `data[start..=end]`
pub fn build_partial_response(
    data: Bytes,
    file: &FileValidators<'_>,
    start: usize,
    end: usize,
    total_size: usize,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    let mut builder = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header("Content-Type", file.content_type)
        .header("Content-Length", content_length)
        .header("Content-Range", format!("bytes {start}-{end}/{total_size}"))
        .header("Accept-Ranges", "bytes")
        .header("ETag", file.etag)
        .header("Cache-Control", "no-cache");
    if let Some(last_modified) = file.last_modified {
        builder = builder.header("Last-Modified", last_modified);
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("206", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(resp: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_success_envelope_with_filename() {
        let envelope = Envelope {
            filename: Some("1-a.glb"),
            ..Envelope::ok("File uploaded successfully")
        };
        let resp = json_response(StatusCode::OK, &envelope);
        assert_eq!(resp.headers()["Content-Type"], "application/json");

        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "File uploaded successfully");
        assert_eq!(json["filename"], "1-a.glb");
    }

    #[tokio::test]
    async fn test_error_envelope_has_no_filename() {
        let resp = build_error_response(&ApiError::NotFound("Model not found".into()));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let json = body_json(resp).await;
        assert_eq!(json, serde_json::json!({"success": false, "message": "Model not found"}));
    }

    #[test]
    fn test_method_not_allowed_sets_allow() {
        let resp = build_error_response(&ApiError::MethodNotAllowed {
            allow: "GET, DELETE, OPTIONS",
        });
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()["Allow"], "GET, DELETE, OPTIONS");
    }

    #[tokio::test]
    async fn test_head_keeps_length_drops_body() {
        let file = FileValidators {
            content_type: "model/gltf-binary",
            etag: "W/\"4-0\"",
            last_modified: None,
        };
        let resp = build_file_response(Bytes::from_static(b"glTF"), &file, true);
        assert_eq!(resp.headers()["Content-Length"], "4");
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }
}
