//! Blob transports
//!
//! - `LocalBlobTransport`: a directory acting as the blob store
//! - `HttpBlobTransport`: distribution endpoint for downloads, optional
//!   upload endpoint for PUTs

mod http;
mod local;

pub use http::HttpBlobTransport;
pub use local::LocalBlobTransport;
