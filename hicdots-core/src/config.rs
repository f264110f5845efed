use std::fmt::{self, Display};
use std::fs::read_to_string;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::errors::{DotsError, Result, ValidationError};
use crate::models::kernel::{Kernel, hiccups_kernels};

///
/// How per-pixel p-values are turned into q-values.
///
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum QValueMethod {
    /// Benjamini-Hochberg over every tested pixel of the genome
    #[default]
    GenomeWide,
    /// HiCCUPS-style: BH inside each lambda chunk, from the merged histograms
    LambdaChunked,
}

impl Display for QValueMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QValueMethod::GenomeWide => write!(f, "genome-wide"),
            QValueMethod::LambdaChunked => write!(f, "lambda-chunked"),
        }
    }
}

impl FromStr for QValueMethod {
    type Err = DotsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "genome-wide" => Ok(QValueMethod::GenomeWide),
            "lambda-chunked" => Ok(QValueMethod::LambdaChunked),
            _ => Err(DotsError::InvalidParameter(format!(
                "unknown q-value method: {}. Valid options are 'genome-wide' or 'lambda-chunked'",
                s
            ))),
        }
    }
}

///
/// Fold-enrichment and orphan-FDR thresholds applied to cluster centroids.
///
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct EnrichmentThresholds {
    /// vertical and horizontal
    pub factor_1: f64,
    /// lowleft and donut
    pub factor_2: f64,
    /// lowleft or donut
    pub factor_3: f64,
    /// maximum sum of the four q-values for single-pixel clusters
    pub orphan_fdr: f64,
}

impl Default for EnrichmentThresholds {
    fn default() -> Self {
        EnrichmentThresholds {
            factor_1: ENRICHMENT_FACTOR_1,
            factor_2: ENRICHMENT_FACTOR_2,
            factor_3: ENRICHMENT_FACTOR_3,
            orphan_fdr: FDR_ORPHAN_THRESHOLD,
        }
    }
}

///
/// User-facing configuration, in base pairs. Loadable from TOML; every field is optional.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DotCallerConfig {
    pub max_loci_separation: u64,
    pub max_nans_tolerated: u32,
    pub tile_size: u64,
    pub fdr: f64,
    pub clustering_radius: u64,
    pub threads: usize,
    pub qvalue_method: QValueMethod,
    pub expected_name: String,
    pub weight_name: String,
    /// chromosomes to analyse; all matrix chromosomes when unset
    pub chromosomes: Option<Vec<String>>,
    pub enrichment: EnrichmentThresholds,
    pub progress: bool,
}

impl Default for DotCallerConfig {
    fn default() -> Self {
        DotCallerConfig {
            max_loci_separation: DEFAULT_MAX_LOCI_SEPARATION,
            max_nans_tolerated: DEFAULT_MAX_NANS_TOLERATED,
            tile_size: DEFAULT_TILE_SIZE,
            fdr: DEFAULT_FDR,
            clustering_radius: DEFAULT_CLUSTERING_RADIUS,
            threads: 1,
            qvalue_method: QValueMethod::default(),
            expected_name: DEFAULT_EXPECTED_NAME.to_string(),
            weight_name: DEFAULT_WEIGHT_NAME.to_string(),
            chromosomes: None,
            enrichment: EnrichmentThresholds::default(),
            progress: false,
        }
    }
}

impl TryFrom<&Path> for DotCallerConfig {
    type Error = DotsError;

    fn try_from(path: &Path) -> Result<Self> {
        let toml_str = read_to_string(path)?;
        let config = toml::from_str(&toml_str)?;
        Ok(config)
    }
}

///
/// Kernel half-width `w` and pad `p` for a resolution.
///
/// Resolutions outside 4-28 kb are rejected.
///
pub fn kernel_params_for_resolution(bin_size: u64) -> std::result::Result<(usize, usize), ValidationError> {
    match bin_size {
        b if b > MAX_BIN_SIZE => Err(ValidationError::UnsupportedResolution {
            bin_size,
            reason: "too coarse",
        }),
        b if b >= 18_000 => Ok((3, 1)),
        b if b >= 8_000 => Ok((5, 2)),
        b if b >= MIN_BIN_SIZE => Ok((7, 4)),
        _ => Err(ValidationError::UnsupportedResolution {
            bin_size,
            reason: "too fine",
        }),
    }
}

///
/// Immutable parameters of one run, resolved to bins. Built once and borrowed by every
/// stage and worker.
///
#[derive(Debug, Clone)]
pub struct CallingParams {
    pub bin_size: u64,
    pub chromosomes: Vec<String>,
    pub kernels: Vec<Kernel>,
    pub kernel_half_width: usize,
    pub band_bins: usize,
    pub tile_bins: usize,
    pub max_nans_tolerated: u32,
    pub fdr: f64,
    pub clustering_radius: u64,
    pub qvalue_method: QValueMethod,
    pub enrichment: EnrichmentThresholds,
    pub threads: usize,
    pub channel_capacity: usize,
    pub progress: bool,
}

impl CallingParams {
    ///
    /// Resolve a configuration against the matrix resolution.
    ///
    /// # Arguments
    /// - config: user configuration
    /// - bin_size: resolution of the contact matrix, in bp
    /// - chromosomes: the validated list of chromosomes to analyse
    pub fn resolve(config: &DotCallerConfig, bin_size: u64, chromosomes: Vec<String>) -> Result<Self> {
        let (w, p) = kernel_params_for_resolution(bin_size)?;

        if config.max_nans_tolerated == 0 {
            return Err(DotsError::InvalidParameter(
                "max_nans_tolerated must be at least 1".to_string(),
            ));
        }
        if !(config.fdr > 0.0 && config.fdr <= 1.0) {
            return Err(DotsError::InvalidParameter(format!(
                "fdr must lie in (0, 1], got {}",
                config.fdr
            )));
        }
        if config.threads == 0 {
            return Err(DotsError::InvalidParameter("threads must be at least 1".to_string()));
        }

        let band_bins = (config.max_loci_separation / bin_size) as usize;
        let tile_bins = (config.tile_size / bin_size) as usize;
        if band_bins == 0 || tile_bins == 0 {
            return Err(DotsError::InvalidParameter(format!(
                "max_loci_separation ({}) and tile_size ({}) must each span at least one {} bp bin",
                config.max_loci_separation, config.tile_size, bin_size
            )));
        }

        Ok(CallingParams {
            bin_size,
            chromosomes,
            kernels: hiccups_kernels(w, p)?,
            kernel_half_width: w,
            band_bins,
            tile_bins,
            max_nans_tolerated: config.max_nans_tolerated,
            fdr: config.fdr,
            clustering_radius: config.clustering_radius,
            qvalue_method: config.qvalue_method,
            enrichment: config.enrichment,
            threads: config.threads,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            progress: config.progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Write;

    #[rstest]
    #[case(5_000, (7, 4))]
    #[case(10_000, (5, 2))]
    #[case(25_000, (3, 1))]
    #[case(4_000, (7, 4))]
    #[case(28_000, (3, 1))]
    fn test_supported_resolutions(#[case] bin_size: u64, #[case] expected: (usize, usize)) {
        assert_eq!(kernel_params_for_resolution(bin_size).unwrap(), expected);
    }

    #[rstest]
    #[case(1_000)]
    #[case(3_999)]
    #[case(28_001)]
    #[case(100_000)]
    fn test_unsupported_resolutions(#[case] bin_size: u64) {
        assert!(matches!(
            kernel_params_for_resolution(bin_size),
            Err(ValidationError::UnsupportedResolution { .. })
        ));
    }

    #[rstest]
    fn test_resolve_defaults() {
        let params = CallingParams::resolve(&DotCallerConfig::default(), 10_000, vec![]).unwrap();
        assert_eq!(params.band_bins, 200);
        assert_eq!(params.tile_bins, 600);
        assert_eq!(params.kernel_half_width, 5);
        assert_eq!(params.kernels.len(), 4);
    }

    #[rstest]
    fn test_resolve_rejects_bad_parameters() {
        let config = DotCallerConfig {
            fdr: 0.0,
            ..Default::default()
        };
        assert!(CallingParams::resolve(&config, 10_000, vec![]).is_err());

        let config = DotCallerConfig {
            tile_size: 5_000,
            ..Default::default()
        };
        assert!(CallingParams::resolve(&config, 10_000, vec![]).is_err());
    }

    #[rstest]
    fn test_try_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "fdr = 0.1\nthreads = 4\nqvalue_method = \"lambda-chunked\"\n\n[enrichment]\nfactor_3 = 3.0"
        )
        .unwrap();

        let config = DotCallerConfig::try_from(file.path()).unwrap();
        assert_eq!(config.fdr, 0.1);
        assert_eq!(config.threads, 4);
        assert_eq!(config.qvalue_method, QValueMethod::LambdaChunked);
        assert_eq!(config.enrichment.factor_3, 3.0);
        assert_eq!(config.enrichment.factor_1, ENRICHMENT_FACTOR_1);
        assert_eq!(config.tile_size, DEFAULT_TILE_SIZE);
    }
}
