pub mod dot;
pub mod expected;
pub mod kernel;
pub mod lambda;
pub mod matrix;
pub mod pixel;
pub mod tile;

// re-export for cleaner imports
pub use self::dot::{ClusterInfo, DotCall, DotCandidate};
pub use self::expected::{ExpectedProfile, ExpectedTable, ExpectedView};
pub use self::kernel::{Kernel, KernelKind, hiccups_kernels};
pub use self::lambda::{KernelHistograms, LambdaBins, LambdaHistogram};
pub use self::matrix::{BinCoords, Chromosome, ContactMatrix, SparseContactMatrix};
pub use self::pixel::{KernelScores, PixelSink, ScoredPixel};
pub use self::tile::Tile;
