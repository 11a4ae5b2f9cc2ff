//! HTTP status API for the desktop UI
//!
//! This module provides a small REST surface over the upload registry:
//! - POST /uploads - Hand off a finished recording for upload
//! - GET /uploads - Recently begun uploads (oldest first)
//! - GET /uploads/:id - One upload's progress
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
