//! Record store subsystem.
//!
//! # Data Flow
//! ```text
//! startup
//!     → collection.rs (read backing file, tolerate failure)
//!     → ids.rs (seed allocator from loaded ids)
//!     → persist.rs (spawn single writer for the backing file)
//!
//! mutation (insert / replace / delete)
//!     → collection.rs (apply under write lock)
//!     → persist.rs (enqueue snapshot, hand back ticket)
//!     → caller answers from memory, optionally awaits ticket
//! ```
//!
//! # Design Decisions
//! - The store is an explicit object owned by the application state, never a global
//! - Snapshots are enqueued while the write lock is held so the writer sees them in mutation order
//! - A failed load degrades to an empty collection instead of aborting startup
//! - The backing file is a JSON array of records; id-keyed maps are not read

pub mod collection;
pub mod ids;
pub mod persist;
pub mod record;

pub use collection::{Mutation, RecordStore, StoreError};
pub use persist::{PersistError, PersistTicket};
pub use record::{FieldError, Record, RecordFields, RecordPatch, RecordPayload};
