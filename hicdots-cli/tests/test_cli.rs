//! Command-line tests for `hicdots call-dots`

use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const N: u64 = 120;

// one chromosome with a smooth decay and a strong 3x3 dot centred on (40, 55)
fn write_inputs(dir: &Path, bin: u64) -> (PathBuf, PathBuf, PathBuf) {
    let bins = dir.join("bins.tsv");
    let pixels = dir.join("pixels.tsv");
    let expected = dir.join("expected.tsv");
    let decay = |d: u64| 50.0 / (1.0 + d as f64);

    let mut f = std::fs::File::create(&bins).unwrap();
    writeln!(f, "chrom\tstart\tend\tweight").unwrap();
    for k in 0..N {
        writeln!(f, "chr1\t{}\t{}\t1.0", k * bin, (k + 1) * bin).unwrap();
    }

    let mut f = std::fs::File::create(&pixels).unwrap();
    writeln!(f, "bin1_id\tbin2_id\tcount").unwrap();
    for i in 0..N {
        for j in i..(i + 40).min(N) {
            let mut count = decay(j - i).round() as u32;
            if i.abs_diff(40) <= 1 && j.abs_diff(55) <= 1 {
                count += if i == 40 && j == 55 { 60 } else { 30 };
            }
            if count > 0 {
                writeln!(f, "{}\t{}\t{}", i, j, count).unwrap();
            }
        }
    }

    let mut f = std::fs::File::create(&expected).unwrap();
    writeln!(f, "chrom\tdiag\tbalanced.avg").unwrap();
    for d in 0..N {
        writeln!(f, "chr1\t{}\t{}", d, decay(d)).unwrap();
    }

    (bins, pixels, expected)
}

fn call_dots(bins: &Path, pixels: &Path, expected: &Path, out: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hicdots").unwrap();
    cmd.arg("call-dots")
        .arg("--bins")
        .arg(bins)
        .arg("--pixels")
        .arg(pixels)
        .arg("--expected")
        .arg(expected)
        .arg("--max-loci-separation")
        .arg("300000")
        .arg("--tile-size")
        .arg("500000")
        .arg("-o")
        .arg(out);
    cmd
}

#[test]
fn test_call_dots_writes_every_output() {
    let dir = tempdir().unwrap();
    let (bins, pixels, expected) = write_inputs(dir.path(), 10_000);
    let out = dir.path().join("dots.tsv");
    let scores = dir.path().join("scores.tsv.gz");
    let prefix = dir.path().join("hists").join("run");

    call_dots(&bins, &pixels, &expected, &out)
        .arg("-n")
        .arg("2")
        .arg("-s")
        .arg(&scores)
        .arg("--output-hists")
        .arg(&prefix)
        .assert()
        .success();

    let calls = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = calls.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("chrom1\tstart1\tend1\tchrom2\tstart2\tend2"));
    assert!(lines[1].starts_with("chr1\t400000\t410000\tchr1\t550000\t560000"));

    assert!(scores.exists());
    for kind in ["donut", "vertical", "horizontal", "lowleft"] {
        assert!(dir.path().join("hists").join(format!("run.{}.hist.txt", kind)).exists());
    }
}

#[test]
fn test_unsupported_resolution_fails() {
    let dir = tempdir().unwrap();
    let (bins, pixels, expected) = write_inputs(dir.path(), 50_000);
    let out = dir.path().join("dots.tsv");

    call_dots(&bins, &pixels, &expected, &out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("resolution 50000 bp"));
    assert!(!out.exists());
}

#[test]
fn test_unknown_qvalue_method_is_rejected() {
    let dir = tempdir().unwrap();
    let (bins, pixels, expected) = write_inputs(dir.path(), 10_000);
    let out = dir.path().join("dots.tsv");

    call_dots(&bins, &pixels, &expected, &out)
        .arg("--qvalue-method")
        .arg("per-tile")
        .assert()
        .failure();
}
