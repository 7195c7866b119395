//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: CORS preflight, route matching,
//! error translation and access logging.

use crate::config::AppState;
use crate::error::ApiError;
use crate::handler::{models, static_files, upload};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, ORIGIN, RANGE, REFERER, USER_AGENT};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context for static file serving
pub struct RequestContext {
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub range_header: Option<String>,
}

/// Known routes
#[derive(Debug, PartialEq, Eq)]
enum Route {
    /// `/models`
    Models,
    /// `/models/{filename}`
    Model(String),
    /// `/uploads`
    Uploads,
    /// `/uploads/{filename}`
    UploadedFile(String),
    Unknown,
}

impl Route {
    fn parse(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "/models" => return Self::Models,
            "/uploads" => return Self::Uploads,
            _ => {}
        }

        if let Some(name) = trimmed.strip_prefix("/models/") {
            if !name.contains('/') {
                return Self::Model(name.to_string());
            }
        } else if let Some(name) = trimmed.strip_prefix("/uploads/") {
            return Self::UploadedFile(name.to_string());
        }
        Self::Unknown
    }
}

/// Main entry point for HTTP request handling
///
/// Never fails: every error is turned into a response here.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let mut entry = access_entry(&req, peer_addr);
    let origin = req.headers().get(ORIGIN).cloned();
    let is_preflight = req.method() == Method::OPTIONS;

    let mut response = if is_preflight {
        http::build_no_content_response()
    } else {
        match dispatch(req, &state).await {
            Ok(resp) => resp,
            Err(err) => {
                let detail = format!("{} {}: {}", entry.method, entry.path, err.log_detail());
                if err.status().is_server_error() {
                    logger::log_error(&detail);
                } else {
                    logger::log_warning(&detail);
                }
                http::build_error_response(&err)
            }
        }
    };

    if is_preflight {
        state.cors.apply_preflight(origin.as_ref(), response.headers_mut());
    } else {
        state.cors.apply(origin.as_ref(), response.headers_mut());
    }

    if state.config.logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request to its handler
async fn dispatch<B>(req: Request<B>, state: &AppState) -> Result<Response<Full<Bytes>>, ApiError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (Route::parse(&path), method) {
        (Route::Models, Method::GET | Method::HEAD) => models::list_models(state).await,
        (Route::Models, _) => Err(ApiError::MethodNotAllowed {
            allow: "GET, HEAD, OPTIONS",
        }),
        (Route::Model(name), Method::DELETE) => models::delete_model(state, &name).await,
        (Route::Model(_), _) => Err(ApiError::MethodNotAllowed {
            allow: "DELETE, OPTIONS",
        }),
        (Route::Uploads, Method::POST) => upload::handle_upload(req, state).await,
        (Route::Uploads, _) => Err(ApiError::MethodNotAllowed {
            allow: "POST, OPTIONS",
        }),
        (Route::UploadedFile(name), m @ (Method::GET | Method::HEAD)) => {
            let ctx = RequestContext {
                is_head: m == Method::HEAD,
                if_none_match: header_string(req.headers().get("if-none-match")),
                range_header: header_string(req.headers().get(RANGE)),
            };
            static_files::serve_model(&ctx, &state.store, &name).await
        }
        (Route::UploadedFile(_), _) => Err(ApiError::MethodNotAllowed {
            allow: "GET, HEAD, OPTIONS",
        }),
        (Route::Unknown, _) => Err(ApiError::NotFound("Not found".to_string())),
    }
}

fn header_string(value: Option<&HeaderValue>) -> Option<String> {
    value
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
    .to_string();
    entry.referer = header_string(req.headers().get(REFERER));
    entry.user_agent = header_string(req.headers().get(USER_AGENT));
    entry.origin = header_string(req.headers().get(ORIGIN));
    entry
}
