//! HTTP protocol layer module
//!
//! Response builders, CORS policy and file-serving helpers, independent of
//! the model API itself.

pub mod cache;
pub mod cors;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range_header, RangeParseResult};
pub use response::{
    build_304_response, build_404_response, build_416_response, build_error_response,
    build_no_content_response, json_response, Envelope,
};
