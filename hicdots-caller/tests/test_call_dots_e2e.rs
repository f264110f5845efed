//! End-to-end integration test: bins + pixels + expected tables → dot calls

use std::io::Write;
use std::path::{Path, PathBuf};

use hicdots_caller::DotCaller;
use hicdots_core::models::{KernelKind, SparseContactMatrix};
use hicdots_core::{DotCallerConfig, DotsError, QValueMethod, ValidationError};
use hicdots_io::{
    DOT_CALL_COLUMNS, DotCallWrite, ScoredPixelWriter, load_contact_matrix, read_expected,
    write_histograms,
};
use tempfile::{TempDir, tempdir};

const BIN: u64 = 10_000;
const CHROMS: [(&str, usize); 2] = [("chr1", 200), ("chr2", 150)];

// chromosome-local (bin1, bin2) of the planted 3x3 dots
const DOTS: [(&str, usize, usize); 2] = [("chr1", 50, 70), ("chr2", 30, 45)];

fn decay(d: usize) -> f64 {
    50.0 / (1.0 + d as f64)
}

/// Write bins, pixels and expected tables for a smooth distance-decay map with one
/// strong 3x3 dot per chromosome.
fn write_inputs(dir: &Path, with_chr2_expected: bool) -> (PathBuf, PathBuf, PathBuf) {
    let bins_path = dir.join("bins.tsv");
    let pixels_path = dir.join("pixels.tsv.gz");
    let expected_path = dir.join("expected.tsv");

    {
        let mut f = std::fs::File::create(&bins_path).unwrap();
        writeln!(f, "chrom\tstart\tend\tweight").unwrap();
        for (chrom, n) in CHROMS {
            for k in 0..n {
                writeln!(f, "{}\t{}\t{}\t1.0", chrom, k as u64 * BIN, (k as u64 + 1) * BIN).unwrap();
            }
        }
    }

    {
        let file = std::fs::File::create(&pixels_path).unwrap();
        let mut f = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        writeln!(f, "bin1_id\tbin2_id\tcount").unwrap();
        let mut offset = 0;
        for (chrom, n) in CHROMS {
            for i in 0..n {
                for j in i..(i + 60).min(n) {
                    let mut count = decay(j - i).round() as u32;
                    for (dot_chrom, di, dj) in DOTS {
                        if dot_chrom == chrom && i.abs_diff(di) <= 1 && j.abs_diff(dj) <= 1 {
                            count += if i == di && j == dj { 60 } else { 30 };
                        }
                    }
                    if count > 0 {
                        writeln!(f, "{}\t{}\t{}", offset + i, offset + j, count).unwrap();
                    }
                }
            }
            offset += n;
        }
        f.finish().unwrap();
    }

    {
        let mut f = std::fs::File::create(&expected_path).unwrap();
        writeln!(f, "region\tdiag\tn_valid\tcount.sum\tbalanced.avg").unwrap();
        for (chrom, n) in CHROMS {
            if chrom == "chr2" && !with_chr2_expected {
                continue;
            }
            for d in 0..n {
                writeln!(f, "{}\t{}\t{}\t0\t{}", chrom, d, n - d, decay(d)).unwrap();
            }
        }
    }

    (bins_path, pixels_path, expected_path)
}

fn load(dir: &TempDir, with_chr2_expected: bool) -> (SparseContactMatrix, hicdots_core::models::ExpectedTable) {
    let (bins, pixels, expected) = write_inputs(dir.path(), with_chr2_expected);
    let matrix = load_contact_matrix(&bins, &pixels, "weight").unwrap();
    let expected = read_expected(&expected, "balanced.avg").unwrap();
    (matrix, expected)
}

fn config(method: QValueMethod) -> DotCallerConfig {
    DotCallerConfig {
        max_loci_separation: 400_000,
        tile_size: 1_000_000,
        threads: 4,
        qvalue_method: method,
        ..Default::default()
    }
}

#[test]
fn test_planted_dots_are_called() {
    let dir = tempdir().unwrap();
    let (matrix, expected) = load(&dir, true);

    for method in [QValueMethod::GenomeWide, QValueMethod::LambdaChunked] {
        let caller = DotCaller::new(&matrix, &expected, &config(method)).unwrap();
        let result = caller.call(None).unwrap();

        assert_eq!(result.dots.len(), 2, "method {}", method);
        assert_eq!(result.n_clusters, 2, "method {}", method);

        for (dot, (chrom, di, dj)) in result.dots.iter().zip(DOTS) {
            let pixel = dot.pixel();
            assert_eq!(&*pixel.chrom1, chrom);
            assert_eq!(pixel.start1, di as u64 * BIN);
            assert_eq!(pixel.start2, dj as u64 * BIN);
            assert_eq!(dot.cluster().size, 9);
            assert_eq!(dot.cluster().label, 0);
            assert_eq!(dot.cluster().cstart1, pixel.start1 as f64);
            assert_eq!(dot.cluster().cstart2, pixel.start2 as f64);
            for kind in KernelKind::ALL {
                assert!(pixel.qvalue(kind).unwrap() <= 0.02);
                assert!(pixel.observed as f64 > 2.0 * pixel.la_exp(kind).unwrap());
            }
        }
    }
}

#[test]
fn test_outputs_are_written() {
    let dir = tempdir().unwrap();
    let (matrix, expected) = load(&dir, true);
    let caller = DotCaller::new(&matrix, &expected, &config(QValueMethod::GenomeWide)).unwrap();

    let scores_path = dir.path().join("out").join("scores.tsv.gz");
    let mut writer = ScoredPixelWriter::create(&scores_path, &KernelKind::ALL).unwrap();
    let result = caller.call(Some(&mut writer)).unwrap();
    assert_eq!(writer.rows(), result.n_scored);
    drop(writer);
    assert!(scores_path.exists());

    let prefix = dir.path().join("out").join("run").to_string_lossy().to_string();
    let paths = write_histograms(&result.histograms, caller.lambda_bins(), &prefix).unwrap();
    assert_eq!(paths.len(), 4);
    assert!(paths.iter().all(|p| p.exists()));

    let calls_path = dir.path().join("out").join("dots.tsv");
    result.dots.write_dot_calls(&calls_path).unwrap();
    let calls = std::fs::read_to_string(&calls_path).unwrap();
    let lines: Vec<&str> = calls.lines().collect();
    assert_eq!(lines[0], DOT_CALL_COLUMNS.join("\t"));
    assert_eq!(lines.len(), 1 + result.dots.len());
}

#[test]
fn test_missing_expected_chromosome_fails_fast() {
    let dir = tempdir().unwrap();
    let (matrix, expected) = load(&dir, false);

    let result = DotCaller::new(&matrix, &expected, &config(QValueMethod::GenomeWide));
    match result {
        Err(DotsError::Validation(ValidationError::ChromosomeMismatch { missing, .. })) => {
            assert_eq!(missing, vec!["chr2".to_string()]);
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("validation should have failed"),
    }

    // restricting the run to chr1 is fine
    let config = DotCallerConfig {
        chromosomes: Some(vec!["chr1".to_string()]),
        ..config(QValueMethod::GenomeWide)
    };
    let result = DotCaller::new(&matrix, &expected, &config).unwrap().call(None).unwrap();
    assert_eq!(result.dots.len(), 1);
}
