use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crossbeam_channel::bounded;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rayon::prelude::*;

use hicdots_core::models::{
    ContactMatrix, DotCall, DotCandidate, ExpectedTable, KernelHistograms, KernelKind, LambdaBins,
    PixelSink, ScoredPixel, Tile,
};
use hicdots_core::{CallingParams, DotCallerConfig, DotsError, Result};

use crate::clustering::Clusterer;
use crate::enrichment::EnrichmentFilter;
use crate::lambda::LambdaHistogramAccumulator;
use crate::scoring::{ScoringOutcome, TileScorer};
use crate::significance::{SignificanceTester, fdr_compliant};
use crate::tiling::TileGenerator;
use crate::validation::validate_inputs;

// what a worker sends back for one tile
struct TileResult {
    tile: Tile,
    pixels: Vec<ScoredPixel>,
    histograms: KernelHistograms,
}

///
/// Summary of a complete run.
///
#[derive(Debug, Clone)]
pub struct DotCallingResult {
    pub histograms: KernelHistograms,
    pub n_scored: usize,
    pub n_compliant: usize,
    pub n_clusters: usize,
    pub dots: Vec<DotCall>,
}

///
/// Drives the whole dot-calling pipeline over one contact matrix.
///
/// Inputs are validated and parameters resolved when the caller is built, so no tile
/// is ever scored against inconsistent inputs.
///
pub struct DotCaller<'a, M: ContactMatrix + ?Sized> {
    matrix: &'a M,
    expected: &'a ExpectedTable,
    params: CallingParams,
    bins: LambdaBins,
}

impl<'a, M: ContactMatrix + ?Sized> DotCaller<'a, M> {
    ///
    /// Validate the inputs and resolve `config` against the matrix resolution.
    ///
    /// # Arguments
    /// - matrix: contact matrix with balancing weights
    /// - expected: cis expected table matching the matrix
    /// - config: run configuration
    pub fn new(matrix: &'a M, expected: &'a ExpectedTable, config: &DotCallerConfig) -> Result<Self> {
        let chromosomes = validate_inputs(matrix, expected, config.chromosomes.as_deref())?;
        let params = CallingParams::resolve(config, matrix.bin_size(), chromosomes)?;

        info!(
            "Kernel half-width {} bins, band {} bins, tiles of {} bins",
            params.kernel_half_width, params.band_bins, params.tile_bins
        );

        Ok(DotCaller {
            matrix,
            expected,
            params,
            bins: LambdaBins::default(),
        })
    }

    pub fn params(&self) -> &CallingParams {
        &self.params
    }

    pub fn lambda_bins(&self) -> &LambdaBins {
        &self.bins
    }

    pub fn tiles(&self) -> TileGenerator {
        let chromosomes = self
            .params
            .chromosomes
            .iter()
            .filter_map(|name| self.matrix.chromosome(name).cloned())
            .collect();
        TileGenerator::new(
            chromosomes,
            self.params.tile_bins,
            self.params.kernel_half_width,
            self.params.band_bins,
        )
    }

    ///
    /// Score every tile on a dedicated worker pool.
    ///
    /// Workers send their pixels and partial histograms over a bounded channel to a
    /// single coordinator, which merges histograms and is the only one to touch `sink`.
    /// The first failing tile aborts the run.
    ///
    pub fn score(&self, sink: Option<&mut dyn PixelSink>) -> Result<ScoringOutcome> {
        let tiles: Vec<Tile> = self.tiles().iter().collect();
        let tiles_expected = tiles.len();
        info!(
            "Scoring {} tiles on {} chromosomes with {} threads",
            tiles_expected,
            self.params.chromosomes.len(),
            self.params.threads
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.params.threads)
            .build()
            .map_err(|e| DotsError::WorkerFailure(format!("cannot start worker pool: {}", e)))?;

        let scorer = TileScorer::from_params(self.matrix, self.expected, &self.params);
        let kinds: Vec<KernelKind> = self.params.kernels.iter().map(|k| k.kind).collect();
        let accumulator = LambdaHistogramAccumulator::new(self.bins.clone(), &kinds);
        let progress = progress_bar(tiles_expected as u64, self.params.progress);

        let (tx, rx) = bounded::<TileResult>(self.params.channel_capacity);

        let (work, coordinated) = std::thread::scope(|scope| {
            let accumulator = &accumulator;
            let coordinator_progress = progress.clone();
            let coordinator = scope.spawn(move || -> Result<ScoringOutcome> {
                let mut sink = sink;
                let mut outcome = ScoringOutcome {
                    histograms: accumulator.empty(),
                    tiles_expected,
                    ..Default::default()
                };
                for result in rx.iter() {
                    if let Some(sink) = sink.as_mut() {
                        sink.append(&result.pixels)?;
                    }
                    accumulator.merge(&mut outcome.histograms, &result.histograms);
                    debug!("Merged tile {} ({} pixels)", result.tile, result.pixels.len());
                    outcome.pixels.extend(result.pixels);
                    outcome.tiles_scored += 1;
                    coordinator_progress.inc(1);
                }
                if let Some(sink) = sink.as_mut() {
                    sink.finish()?;
                }
                Ok(outcome)
            });

            let work: Result<()> = pool.install(|| {
                tiles.par_iter().try_for_each_with(tx, |tx, tile| {
                    let pixels = catch_unwind(AssertUnwindSafe(|| scorer.score(tile))).map_err(|panic| {
                        DotsError::WorkerFailure(format!("tile {} panicked: {}", tile, panic_message(&*panic)))
                    })??;
                    let histograms = accumulator.accumulate(&pixels);
                    tx.send(TileResult {
                        tile: tile.clone(),
                        pixels,
                        histograms,
                    })
                    .map_err(|_| {
                        DotsError::WorkerFailure(format!("coordinator stopped before tile {} was delivered", tile))
                    })
                })
            });

            let coordinated = coordinator
                .join()
                .map_err(|panic| DotsError::WorkerFailure(format!("coordinator panicked: {}", panic_message(&*panic))));
            (work, coordinated)
        });
        drop(pool);

        // a failing sink closes the channel, so its error takes precedence over the workers'
        let mut outcome = match (work, coordinated?) {
            (_, Err(e)) => return Err(e),
            (Err(e), Ok(_)) => return Err(e),
            (Ok(()), Ok(outcome)) => outcome,
        };
        progress.finish_and_clear();

        if !outcome.is_complete() {
            return Err(DotsError::IncompleteStage {
                stage: "significance testing",
                requires: "scoring of every tile",
            });
        }
        outcome.pixels.sort_by_key(|p| (p.bin1_id, p.bin2_id));

        info!(
            "Scored {} pixels in {} tiles",
            outcome.pixels.len(),
            outcome.tiles_scored
        );
        Ok(outcome)
    }

    /// Assign q-values; requires a complete scoring outcome.
    pub fn test(&self, outcome: &mut ScoringOutcome) -> Result<()> {
        SignificanceTester::new(self.params.qvalue_method, self.bins.clone()).apply(outcome)
    }

    /// Cluster the FDR-compliant pixels of a tested outcome.
    pub fn cluster(&self, outcome: &ScoringOutcome) -> Result<Vec<DotCandidate>> {
        let compliant = fdr_compliant(&outcome.pixels, self.params.fdr);
        info!(
            "{} of {} pixels comply with FDR {}",
            compliant.len(),
            outcome.pixels.len(),
            self.params.fdr
        );
        Clusterer::new(self.params.clustering_radius).cluster(&compliant)
    }

    pub fn filter(&self, candidates: Vec<DotCandidate>) -> Result<Vec<DotCall>> {
        EnrichmentFilter::new(self.params.enrichment).filter(candidates)
    }

    ///
    /// Run every stage: score, test, cluster, filter.
    ///
    pub fn call(&self, sink: Option<&mut dyn PixelSink>) -> Result<DotCallingResult> {
        let mut outcome = self.score(sink)?;
        self.test(&mut outcome)?;

        let candidates = self.cluster(&outcome)?;
        let n_compliant = candidates.iter().map(|c| c.cluster.size).sum();
        let n_clusters = candidates.len();
        let dots = self.filter(candidates)?;

        info!("Called {} dots", dots.len());
        Ok(DotCallingResult {
            histograms: outcome.histograms,
            n_scored: outcome.pixels.len(),
            n_compliant,
            n_clusters,
            dots,
        })
    }
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message("Scoring tiles");
    pb
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::ops::Range;

    use hicdots_core::models::{Chromosome, ExpectedProfile, SparseContactMatrix};
    use ndarray::Array2;
    use pretty_assertions::assert_eq;
    use rstest::*;

    const BIN: u64 = 10_000;
    const N: usize = 60;

    fn inputs() -> (SparseContactMatrix, ExpectedTable) {
        let sizes = vec![("chr1".to_string(), N as u64 * BIN)];
        let pixels: Vec<(usize, usize, u32)> = (0..N)
            .flat_map(|i| (i..(i + 15).min(N)).map(move |j| (i, j, (6 - (j - i).min(5)) as u32)))
            .collect();
        let matrix = SparseContactMatrix::new(BIN, &sizes, vec![1.0; N], &pixels).unwrap();
        let profile: Vec<f64> = (0..N).map(|d| (6 - d.min(5)) as f64).collect();
        let expected = ExpectedTable::new(vec![ExpectedProfile::new("chr1", profile)]);
        (matrix, expected)
    }

    fn config(threads: usize) -> DotCallerConfig {
        DotCallerConfig {
            // (w, p) = (5, 2): footprints clear the diagonal from separation 10 on
            max_loci_separation: 20 * BIN,
            tile_size: 20 * BIN,
            threads,
            ..Default::default()
        }
    }

    #[derive(Default)]
    struct CollectingSink {
        pixels: Vec<ScoredPixel>,
        finished: bool,
    }

    impl PixelSink for CollectingSink {
        fn append(&mut self, pixels: &[ScoredPixel]) -> Result<()> {
            self.pixels.extend_from_slice(pixels);
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    #[rstest]
    #[case(1)]
    #[case(4)]
    fn test_score_is_thread_count_independent(#[case] threads: usize) {
        let (matrix, expected) = inputs();
        let reference = DotCaller::new(&matrix, &expected, &config(1))
            .unwrap()
            .score(None)
            .unwrap();
        let outcome = DotCaller::new(&matrix, &expected, &config(threads))
            .unwrap()
            .score(None)
            .unwrap();

        assert!(outcome.is_complete());
        assert!(!outcome.pixels.is_empty());
        assert_eq!(outcome.pixels, reference.pixels);
        assert_eq!(outcome.histograms, reference.histograms);
        for pixel in &outcome.pixels {
            assert!(pixel.bin2_id >= pixel.bin1_id + 10 && pixel.bin2_id - pixel.bin1_id < 20);
        }
    }

    #[rstest]
    fn test_sink_sees_every_pixel_once() {
        let (matrix, expected) = inputs();
        let caller = DotCaller::new(&matrix, &expected, &config(3)).unwrap();

        let mut sink = CollectingSink::default();
        let outcome = caller.score(Some(&mut sink)).unwrap();
        assert!(sink.finished);

        let mut streamed = sink.pixels.clone();
        streamed.sort_by_key(|p| (p.bin1_id, p.bin2_id));
        assert_eq!(streamed, outcome.pixels);
    }

    #[rstest]
    fn test_stages_refuse_to_skip_testing() {
        let (matrix, expected) = inputs();
        let caller = DotCaller::new(&matrix, &expected, &config(2)).unwrap();
        let outcome = caller.score(None).unwrap();

        // untested pixels cannot be clustered
        let result = Clusterer::new(BIN).cluster(&outcome.pixels);
        assert!(matches!(result, Err(DotsError::IncompleteStage { .. })));
    }

    // fails on one tile only
    struct FaultyMatrix {
        inner: SparseContactMatrix,
        bad_row: usize,
        panic: bool,
    }

    impl ContactMatrix for FaultyMatrix {
        fn bin_size(&self) -> u64 {
            self.inner.bin_size()
        }

        fn chromosomes(&self) -> &[Chromosome] {
            self.inner.chromosomes()
        }

        fn observed(&self, rows: Range<usize>, cols: Range<usize>) -> Result<Array2<f64>> {
            if rows.contains(&self.bad_row) {
                if self.panic {
                    panic!("corrupted block");
                }
                let mut block = self.inner.observed(rows, cols)?;
                block[[0, 0]] = 0.5;
                return Ok(block);
            }
            self.inner.observed(rows, cols)
        }

        fn weights(&self, bins: Range<usize>) -> Result<Vec<f64>> {
            self.inner.weights(bins)
        }
    }

    #[rstest]
    fn test_worker_panic_aborts_the_run() {
        let (inner, expected) = inputs();
        let matrix = FaultyMatrix {
            inner,
            bad_row: 45,
            panic: true,
        };
        let caller = DotCaller::new(&matrix, &expected, &config(2)).unwrap();
        let result = caller.score(None);
        assert!(matches!(result, Err(DotsError::WorkerFailure(msg)) if msg.contains("corrupted block")));
    }

    #[rstest]
    fn test_non_integer_counts_abort_the_run() {
        let (inner, expected) = inputs();
        let matrix = FaultyMatrix {
            inner,
            bad_row: 45,
            panic: false,
        };
        let caller = DotCaller::new(&matrix, &expected, &config(2)).unwrap();
        assert!(matches!(caller.call(None), Err(DotsError::DataIntegrity(_))));
    }

    #[rstest]
    fn test_invalid_inputs_fail_before_scoring() {
        let (matrix, _) = inputs();
        let expected = ExpectedTable::new(vec![ExpectedProfile::new("chr1", vec![1.0; N - 1])]);
        assert!(matches!(
            DotCaller::new(&matrix, &expected, &config(1)),
            Err(DotsError::Validation(_))
        ));
    }
}
