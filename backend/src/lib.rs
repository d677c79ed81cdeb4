//! Word Canvas backend service

/// Image generation orchestration and fallback policy
pub mod generation;

/// Handler routes
pub mod routes;

/// HTTP server setup
pub mod server;

/// Application state
pub mod state;

/// Environment configuration and error types
pub mod types;
