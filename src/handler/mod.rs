//! Request handler module
//!
//! Request routing dispatch plus the model API: upload, listing, deletion
//! and static serving of stored files.

pub mod models;
pub mod router;
pub mod static_files;
pub mod upload;

// Re-export main entry point
pub use router::handle_request;
