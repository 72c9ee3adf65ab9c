//! Rendition API Library
//!
//! HTTP boundary for the rendition pipeline: decodes push notifications, runs the
//! orchestrator and maps each job outcome to a response.

pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod trigger;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
