//! Security-related response shaping.
//!
//! # Design Decisions
//! - No authentication or authorization; the service targets a single local client
//! - CORS headers are static and applied outside every other layer

pub mod headers;
