//! Media asset storage backend for the campus directory

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Thumbnail backfill sweep
pub mod backfill;

/// Request handlers
pub mod handlers;

/// Object-store gateway
pub mod media_storage;

/// HTTP server setup
pub mod server;

/// Server-side signed-URL issuing and refresh
pub mod signed_urls;

/// Application state
pub mod state;

/// Thumbnail generation pipeline
pub mod thumbnails;

/// Environment configuration, errors, and extractors
pub mod types;
