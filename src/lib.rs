//! Anime record service library.
//!
//! A small HTTP service exposing create/read/update/delete over a flat
//! collection of anime records kept in memory and mirrored to a JSON file.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod store;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::{Record, RecordStore};
