//! Request routing subsystem.
//!
//! # Route Table
//! ```text
//! GET    /records              → list_all
//! GET    /records?id=X         → find_by_id     (404 when absent)
//! GET    /records?name=X       → find_by_name   (404 when empty)
//! POST   /records              → insert         (201, 400 on missing fields)
//! PUT    /records/{id}         → replace        (400 on missing fields, 404 when absent)
//! DELETE /records/{id}         → delete         (404 when absent)
//! other method, known path     → 405
//! anything else                → 404
//! ```
//!
//! # Design Decisions
//! - `id` wins over `name` when both are supplied
//! - Bodies are validated before the store is touched
//! - Handlers answer from the in-memory result; persistence runs behind them

pub mod handlers;
pub mod query;
pub mod router;

pub use query::{Lookup, RecordQuery};
pub use router::record_routes;
