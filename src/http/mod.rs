//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → routing (route table → handler)
//!     → request.rs (bounded body read, JSON decode)
//!     → store operation
//!     → response.rs (errors as JSON)
//!     → CORS headers → client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::BodyLimits;
pub use response::ApiError;
pub use server::{AppState, HttpServer};
