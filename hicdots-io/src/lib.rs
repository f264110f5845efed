//! # Table readers and writers for Hi-C dot calling.
//!
//! Inputs are plain tab-separated tables with a header line, optionally gzipped:
//! the bins and pixels tables of a contact matrix (as produced by `cooler dump`) and a
//! cis expected table. Outputs are the per-pixel score table, the per-kernel
//! lambda-chunked histograms and the final dot calls.
//!
pub mod consts;
pub mod expected;
pub mod matrix;
mod parse;
pub mod writers;

// re-expose core functions
pub use consts::*;
pub use expected::*;
pub use matrix::*;
pub use writers::*;
