//! MIME type resolution subsystem.
//!
//! # Data Flow
//! ```text
//! At start:
//!     bundled mime-types.json (or configured override file)
//!     → loader.rs (deserialize Vec<MimeType>)
//!     → table.rs (merge developer additions into base)
//!     → MimeTable (immutable, shared via Arc with the static resolver)
//!
//! Per request:
//!     file extension → MimeTable::lookup → content type
//! ```
//!
//! # Design Decisions
//! - Additions only extend base entries with the same `type`
//! - Additions whose type is absent from the base are dropped
//! - Lookup is a linear scan in table order; first entry wins

pub mod loader;
pub mod table;

pub use loader::{load_base_table, MimeError};
pub use table::{MimeTable, MimeType};
