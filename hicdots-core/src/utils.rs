use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

use crate::errors::Result;

fn is_gzipped(path: &Path) -> bool {
    path.extension() == Some(OsStr::new("gz"))
}

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let file = File::open(path)?;
    let file: Box<dyn Read> = match is_gzipped(path) {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

///
/// Output file behind [get_dynamic_writer], plain or gzip-compressed.
///
pub enum DynamicWriter {
    Plain(File),
    Gzip(GzEncoder<File>),
}

impl DynamicWriter {
    ///
    /// Flush everything, including the gzip trailer, reporting any I/O error.
    ///
    pub fn try_finish(&mut self) -> std::io::Result<()> {
        match self {
            DynamicWriter::Plain(file) => file.flush(),
            DynamicWriter::Gzip(encoder) => encoder.try_finish(),
        }
    }
}

impl Write for DynamicWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            DynamicWriter::Plain(file) => file.write(buf),
            DynamicWriter::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            DynamicWriter::Plain(file) => file.flush(),
            DynamicWriter::Gzip(encoder) => encoder.flush(),
        }
    }
}

///
/// Get a writer that gzips its output when the path ends in `.gz`.
/// Parent directories are created as needed.
///
/// Close it with [finish_dynamic_writer]; dropping it silently ignores a failed gzip trailer.
///
/// # Arguments
///
/// - path: path to the file to write
///
pub fn get_dynamic_writer(path: &Path) -> Result<BufWriter<DynamicWriter>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let file = match is_gzipped(path) {
        true => DynamicWriter::Gzip(GzEncoder::new(file, Compression::default())),
        false => DynamicWriter::Plain(file),
    };

    Ok(BufWriter::new(file))
}

///
/// Flush a writer from [get_dynamic_writer] and complete its gzip stream.
///
pub fn finish_dynamic_writer(writer: &mut BufWriter<DynamicWriter>) -> Result<()> {
    writer.flush()?;
    writer.get_mut().try_finish()?;
    Ok(())
}

///
/// Read the header line of a tab-separated table and split it into column names.
///
/// Returns `None` for an empty input.
///
pub fn read_tsv_header<R: BufRead>(reader: &mut R) -> Result<Option<Vec<String>>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let columns = line
        .trim_end_matches(|c: char| c == '\n' || c == '\r')
        .split('\t')
        .map(|s| s.trim().to_string())
        .collect();
    Ok(Some(columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("table.tsv")]
    #[case("table.tsv.gz")]
    fn test_writer_reader_round_trip(#[case] name: &str) {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("nested").join(name);

        {
            let mut writer = get_dynamic_writer(&path).unwrap();
            writeln!(writer, "chrom\tdiag").unwrap();
            writeln!(writer, "chr1\t0").unwrap();
            finish_dynamic_writer(&mut writer).unwrap();
            // the file must be complete without relying on drop
            std::mem::forget(writer);
        }

        let mut reader = get_dynamic_reader(&path).unwrap();
        let header = read_tsv_header(&mut reader).unwrap().unwrap();
        assert_eq!(header, vec!["chrom", "diag"]);
        let rest: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(rest, vec!["chr1\t0"]);
    }
}
