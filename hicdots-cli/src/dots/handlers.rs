use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use hicdots_caller::DotCaller;
use hicdots_core::models::{KernelKind, PixelSink};
use hicdots_core::{DotCallerConfig, QValueMethod};
use hicdots_io::{DotCallWrite, ScoredPixelWriter, load_contact_matrix, read_expected, write_histograms};

///
/// Resolve the run configuration: TOML file first, then any flag given on the command line.
///
pub fn config_from_matches(matches: &ArgMatches) -> Result<DotCallerConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => DotCallerConfig::try_from(Path::new(path))
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => DotCallerConfig::default(),
    };

    if let Some(name) = matches.get_one::<String>("expected-name") {
        config.expected_name = name.clone();
    }
    if let Some(name) = matches.get_one::<String>("weight-name") {
        config.weight_name = name.clone();
    }
    if let Some(nproc) = matches.get_one::<usize>("nproc") {
        config.threads = *nproc;
    }
    if let Some(bp) = matches.get_one::<u64>("max-loci-separation") {
        config.max_loci_separation = *bp;
    }
    if let Some(n) = matches.get_one::<u32>("max-nans-tolerated") {
        config.max_nans_tolerated = *n;
    }
    if let Some(bp) = matches.get_one::<u64>("tile-size") {
        config.tile_size = *bp;
    }
    if let Some(fdr) = matches.get_one::<f64>("fdr") {
        config.fdr = *fdr;
    }
    if let Some(bp) = matches.get_one::<u64>("dots-clustering-radius") {
        config.clustering_radius = *bp;
    }
    if let Some(chroms) = matches.get_many::<String>("chromosomes") {
        config.chromosomes = Some(chroms.cloned().collect());
    }
    if let Some(method) = matches.get_one::<String>("qvalue-method") {
        config.qvalue_method = QValueMethod::from_str(method)?;
    }
    if matches.get_flag("progress") {
        config.progress = true;
    }

    Ok(config)
}

pub fn run_call_dots(matches: &ArgMatches) -> Result<()> {
    let start = Instant::now();

    // required by clap
    let bins = matches.get_one::<String>("bins").context("--bins is required")?;
    let pixels = matches.get_one::<String>("pixels").context("--pixels is required")?;
    let expected = matches.get_one::<String>("expected").context("--expected is required")?;
    let output_calls = matches
        .get_one::<String>("output-calls")
        .context("--output-calls is required")?;

    let config = config_from_matches(matches)?;

    let matrix = load_contact_matrix(bins, pixels, &config.weight_name)
        .with_context(|| format!("Failed to load contact matrix from {} and {}", bins, pixels))?;
    let expected = read_expected(expected, &config.expected_name)
        .with_context(|| format!("Failed to read expected table {}", expected))?;

    let caller = DotCaller::new(&matrix, &expected, &config)?;

    let mut score_writer = match matches.get_one::<String>("output-scores") {
        Some(path) => Some(
            ScoredPixelWriter::create(path, &KernelKind::ALL)
                .with_context(|| format!("Failed to create {}", path))?,
        ),
        None => None,
    };
    let sink = score_writer.as_mut().map(|w| w as &mut dyn PixelSink);
    let result = caller.call(sink)?;

    if let Some(prefix) = matches.get_one::<String>("output-hists") {
        let paths = write_histograms(&result.histograms, caller.lambda_bins(), prefix)?;
        info!("Wrote {} histogram files", paths.len());
    }

    result
        .dots
        .write_dot_calls(output_calls)
        .with_context(|| format!("Failed to write dot calls to {}", output_calls))?;

    info!(
        "Scored {} pixels, {} FDR-compliant in {} clusters, {} dots written to {} ({:.2?})",
        result.n_scored,
        result.n_compliant,
        result.n_clusters,
        result.dots.len(),
        output_calls,
        start.elapsed()
    );

    Ok(())
}
