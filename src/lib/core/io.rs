use flate2::read::MultiGzDecoder;
use gzp::{deflate::Gzip, Compression, ZBuilder};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use super::error::Result;
use super::fs::is_gzipped;

/// Open a plain or gzip-compressed text file for buffered reading.
pub fn open_input<P: AsRef<Path>>(path: P) -> std::io::Result<Box<dyn BufRead + Send>> {
    let file = File::open(path.as_ref())?;
    if is_gzipped(path.as_ref()) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Open an output file, compressing with gzip when `gzipped` is set.
pub fn open_output<P: AsRef<Path>>(
    path: P,
    gzipped: bool,
    threads: usize,
    compression_level: u32,
) -> Result<Box<dyn Write>> {
    let writer = BufWriter::new(File::create(path.as_ref())?);
    if gzipped {
        Ok(Box::new(
            ZBuilder::<Gzip, _>::new()
                .num_threads(threads)
                .compression_level(Compression::new(compression_level))
                .from_writer(writer),
        ))
    } else {
        Ok(Box::new(writer))
    }
}

/// Build a tab-delimited CSV reader over a plain or gzipped file.
pub fn get_reader<P: AsRef<Path>>(
    path: P,
    has_headers: bool,
) -> Result<csv::Reader<Box<dyn BufRead + Send>>> {
    let raw_reader = open_input(path)?;
    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(raw_reader))
}
