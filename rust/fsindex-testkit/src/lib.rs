//! Test utilities shared by the fsindex crates, their benches and the
//! command-line bench.
//!
//! All generators take an explicit `fastrand::Rng`, so a fixed seed gives a
//! reproducible data set.

pub mod data_gen;
