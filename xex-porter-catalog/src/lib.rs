//! Title catalog data model.
//!
//! This crate defines the persistent shape of a catalog entry without any
//! database dependencies. Consumers can use these types directly for
//! display or serialization, or pass them to `xex-porter-db` for persistence.

pub mod types;

pub use types::*;
