//! Core types for xex-porter: title identity and the report parser that
//! produces it.
//!
//! Nothing in this crate touches the filesystem or spawns processes; the
//! inspection tool's text output is handed in by the caller.

pub mod identity;
pub mod report;
pub mod util;

pub use identity::{GameIdentity, IdentityField, ParsedIdentity};
pub use report::parse_identity_report;
