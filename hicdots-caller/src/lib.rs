//! # Calling dots in Hi-C contact matrices.
//!
//! The pipeline follows HiCCUPS: the near-diagonal band of every chromosome is cut into
//! tiles, each tile is convolved with four kernels (donut, vertical, horizontal and
//! lowleft) to estimate a locally-adjusted expected per pixel, pixels are chunked by that
//! expected into log-spaced lambda bins, tested genome-wide for Poisson enrichment,
//! clustered, and the cluster centroids are finally filtered on fold enrichment.
//!
//! ```no_run
//! use hicdots_caller::DotCaller;
//! use hicdots_core::DotCallerConfig;
//! use hicdots_io::{load_contact_matrix, read_expected};
//!
//! let matrix = load_contact_matrix("bins.tsv", "pixels.tsv", "weight").unwrap();
//! let expected = read_expected("expected.tsv", "balanced.avg").unwrap();
//! let caller = DotCaller::new(&matrix, &expected, &DotCallerConfig::default()).unwrap();
//! let result = caller.call(None).unwrap();
//! println!("{} dots", result.dots.len());
//! ```
pub mod clustering;
pub mod enrichment;
pub mod lambda;
pub mod pipeline;
pub mod scoring;
pub mod significance;
pub mod tiling;
pub mod validation;

// re-exports
pub use clustering::*;
pub use enrichment::*;
pub use lambda::*;
pub use pipeline::*;
pub use scoring::*;
pub use significance::*;
pub use tiling::*;
pub use validation::*;
