//! HTTP API for browser and CLI clients
//!
//! - POST /api/chat - Run one voice turn (multipart upload, multipart reply)
//! - GET /api/scenarios - Roleplay scenario catalog
//! - GET /api/languages - Supported learner languages
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;
pub mod wire;

pub use routes::create_router;
pub use state::{AppState, UploadFormat};
