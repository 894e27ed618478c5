//! Integration test crate for the look-ahead queue.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the core and queue crates to verify they work together.

#[cfg(test)]
mod scenarios;

#[cfg(test)]
mod geometry;
