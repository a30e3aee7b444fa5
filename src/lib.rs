//! Library entrypoint for gen-matrix.
//!
//! The primary interface is the `gen-matrix` binary. This lib target exposes
//! the matrix model and table loading to integration tests.

pub mod config;
pub mod matrix;
pub mod output;
