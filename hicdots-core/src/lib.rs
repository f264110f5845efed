//! # Core models for Hi-C dot calling.
//!
//! This crate holds everything the other hicdots crates share: the contact-matrix
//! contract and its sparse in-memory implementation, expected profiles and their lazy
//! Toeplitz view, convolution kernels, tiles, scored pixels and dot calls, together
//! with the run configuration and the error type.
//!
pub mod config;
pub mod consts;
pub mod errors;
pub mod models;
pub mod utils;

// re-exports
pub use config::*;
pub use errors::*;
