//! Bit-level integer codes used to export posting lists compactly.
//!
//! - [`bits`]: MSB-first bit writer and reader.
//! - [`elias`]: Elias gamma and delta codes for integers `>= 1`.
//! - [`postings`]: gap-coded posting lists built on the delta code.

pub mod bits;
pub mod elias;
pub mod postings;

pub use postings::{DeltaCodedPostings, DeltaPostingsEncoder};
