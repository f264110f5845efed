use thiserror::Error;

/// Mismatches between the contact matrix, the expected table and the requested
/// resolution. Always raised before any tile is scored.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Chromosomes {missing:?} from {resource} are absent from {reference}")]
    ChromosomeMismatch {
        resource: String,
        reference: String,
        missing: Vec<String>,
    },

    #[error(
        "Number of bins is not matching for {chrom}: {expected_bins} in expected table, {matrix_bins} in contact matrix"
    )]
    BinCountMismatch {
        chrom: String,
        expected_bins: usize,
        matrix_bins: usize,
    },

    #[error("Contact matrix has resolution {bin_size} bp, which is {reason} for analysis")]
    UnsupportedResolution { bin_size: u64, reason: &'static str },

    #[error("Kernel `{0}` is required but was not configured")]
    MissingKernel(String),
}

#[derive(Error, Debug)]
pub enum DotsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Tile scoring failed, aborting the run: {0}")]
    WorkerFailure(String),

    #[error("Stage `{stage}` cannot run before `{requires}` has completed")]
    IncompleteStage {
        stage: &'static str,
        requires: &'static str,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for hicdots operations.
pub type Result<T> = std::result::Result<T, DotsError>;
