use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use hicdots_core::Result;
use hicdots_core::models::{
    DotCall, KernelHistograms, KernelKind, LambdaBins, PixelSink, ScoredPixel,
};
use hicdots_core::utils::{DynamicWriter, finish_dynamic_writer, get_dynamic_writer};

use crate::consts::{DOT_CALL_COLUMNS, HISTOGRAM_INDEX_COL, HISTOGRAM_SUFFIX};

///
/// Streams scored pixels to a TSV file, one block of rows per tile.
///
pub struct ScoredPixelWriter {
    writer: BufWriter<DynamicWriter>,
    kinds: Vec<KernelKind>,
    rows: usize,
}

impl ScoredPixelWriter {
    ///
    /// Create the file and write its header.
    ///
    /// # Arguments
    /// - path: output path, gzipped when it ends in `.gz`
    /// - kinds: kernels whose statistics get a column group each
    pub fn create<P: AsRef<Path>>(path: P, kinds: &[KernelKind]) -> Result<Self> {
        let mut writer = get_dynamic_writer(path.as_ref())?;

        let mut header = vec![
            "chrom1", "start1", "end1", "chrom2", "start2", "end2", "bin1_id", "bin2_id", "count",
            "expected",
        ]
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
        for kind in kinds {
            header.push(format!("la_exp.{}.value", kind));
            header.push(format!("la_exp.{}.nnans", kind));
            header.push(format!("la_exp.{}.pval", kind));
        }
        writeln!(writer, "{}", header.join("\t"))?;

        Ok(ScoredPixelWriter {
            writer,
            kinds: kinds.to_vec(),
            rows: 0,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl PixelSink for ScoredPixelWriter {
    fn append(&mut self, pixels: &[ScoredPixel]) -> Result<()> {
        for pixel in pixels {
            write!(
                self.writer,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                pixel.chrom1,
                pixel.start1,
                pixel.end1,
                pixel.chrom2,
                pixel.start2,
                pixel.end2,
                pixel.bin1_id,
                pixel.bin2_id,
                pixel.observed,
                pixel.expected
            )?;
            for kind in &self.kinds {
                match pixel.scores(*kind) {
                    Some(s) => write!(self.writer, "\t{}\t{}\t{}", s.value, s.nan_count, s.pvalue)?,
                    None => write!(self.writer, "\t\t\t")?,
                }
            }
            writeln!(self.writer)?;
        }
        self.rows += pixels.len();
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        finish_dynamic_writer(&mut self.writer)
    }
}

///
/// Write one lambda-chunked histogram table per kernel.
///
/// Files are named `<prefix>.<kernel>.hist.txt`; columns are lambda bins, rows are
/// observed values starting at 0.
///
/// # Arguments
/// - histograms: merged genome-wide histograms
/// - bins: the lambda bins the histograms were built with
/// - prefix: output path prefix
pub fn write_histograms(
    histograms: &KernelHistograms,
    bins: &LambdaBins,
    prefix: &str,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for (kind, histogram) in histograms.iter() {
        let path = PathBuf::from(format!("{}.{}.{}", prefix, kind, HISTOGRAM_SUFFIX));
        let mut writer = get_dynamic_writer(&path)?;

        let labels: Vec<String> = (0..histogram.n_bins()).map(|k| bins.label(k)).collect();
        writeln!(writer, "{}\t{}", HISTOGRAM_INDEX_COL, labels.join("\t"))?;

        for observed in 0..histogram.max_len() {
            let row: Vec<String> = (0..histogram.n_bins())
                .map(|k| histogram.bin(k).get(observed).copied().unwrap_or(0).to_string())
                .collect();
            writeln!(writer, "{}\t{}", observed, row.join("\t"))?;
        }
        finish_dynamic_writer(&mut writer)?;

        info!("Wrote {} histogram to {}", kind, path.display());
        paths.push(path);
    }
    Ok(paths)
}

pub trait DotCallWrite {
    ///
    /// Write the final dot calls with their fixed column set.
    ///
    /// # Arguments
    /// - path: output path, gzipped when it ends in `.gz`
    fn write_dot_calls<P: AsRef<Path>>(&self, path: P) -> Result<()>;
}

impl DotCallWrite for [DotCall] {
    fn write_dot_calls<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = get_dynamic_writer(path.as_ref())?;
        writeln!(writer, "{}", DOT_CALL_COLUMNS.join("\t"))?;

        for dot in self {
            writeln!(writer, "{}", dot_call_row(dot))?;
        }
        finish_dynamic_writer(&mut writer)?;
        Ok(())
    }
}

fn dot_call_row(dot: &DotCall) -> String {
    let pixel = dot.pixel();
    let cluster = dot.cluster();

    let mut fields = vec![
        pixel.chrom1.to_string(),
        pixel.start1.to_string(),
        pixel.end1.to_string(),
        pixel.chrom2.to_string(),
        pixel.start2.to_string(),
        pixel.end2.to_string(),
        cluster.cstart1.to_string(),
        cluster.cstart2.to_string(),
        cluster.label.to_string(),
        cluster.size.to_string(),
        pixel.observed.to_string(),
        pixel.expected.to_string(),
    ];
    let values = KernelKind::ALL.iter().map(|k| pixel.la_exp(*k));
    let qvalues = KernelKind::ALL.iter().map(|k| pixel.qvalue(*k));
    fields.extend(values.chain(qvalues).map(|v| v.map_or_else(String::new, |v| v.to_string())));
    fields.join("\t")
}
