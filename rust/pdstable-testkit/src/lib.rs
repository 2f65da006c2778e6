//! Test utilities for the pdstable crates.
//!
//! - `fixtures`: writers for fixed-width and delimited table files together with the
//!   descriptors of their labels
//! - `data_gen`: synthetic index tables
//! - `time`: a minimal ISO time converter for tests that exercise time columns

pub mod data_gen;
pub mod fixtures;
pub mod time;
