//! Core definitions shared by all fsindex-* crates: the error type, the `Result`
//! alias and a couple of verification macros.

pub mod error;
pub mod macros;
pub mod result;

pub use result::Result;

/// A document identifier, as stored in posting lists.
pub type DocId = u64;
