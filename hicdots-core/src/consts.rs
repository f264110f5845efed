// HiCCUPS constants: number of log-spaced lambda bins and their ratio
pub const LAMBDA_LOG_BINS: usize = 40;
pub const LAMBDA_BASE: f64 = 1.259_921_049_894_873_2; // 2^(1/3)

// resolution band, in bp
pub const MIN_BIN_SIZE: u64 = 4_000;
pub const MAX_BIN_SIZE: u64 = 28_000;

pub const DEFAULT_MAX_LOCI_SEPARATION: u64 = 2_000_000;
pub const DEFAULT_MAX_NANS_TOLERATED: u32 = 1;
pub const DEFAULT_TILE_SIZE: u64 = 6_000_000;
pub const DEFAULT_FDR: f64 = 0.02;
pub const DEFAULT_CLUSTERING_RADIUS: u64 = 39_000;
pub const DEFAULT_EXPECTED_NAME: &str = "balanced.avg";
pub const DEFAULT_WEIGHT_NAME: &str = "weight";
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

pub const ENRICHMENT_FACTOR_1: f64 = 1.5;
pub const ENRICHMENT_FACTOR_2: f64 = 1.75;
pub const ENRICHMENT_FACTOR_3: f64 = 2.0;
pub const FDR_ORPHAN_THRESHOLD: f64 = 0.02;
