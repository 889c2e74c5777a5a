//! Whole-file gzip conversion for inputs the external tools can't read compressed.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Decompress a gzip (or bgzip) file. Returns the decompressed size.
///
/// # Errors
///
/// Returns an IO error if the input is not valid gzip or the output can't be written.
pub fn decompress_file(input: &Path, output: &Path) -> std::io::Result<u64> {
    let mut decoder = MultiGzDecoder::new(BufReader::new(File::open(input)?));
    let mut out = BufWriter::new(File::create(output)?);
    let bytes = std::io::copy(&mut decoder, &mut out)?;
    out.flush()?;
    Ok(bytes)
}

/// Gzip-compress a file
///
/// # Errors
///
/// Returns an IO error if the input can't be read or the output written.
pub fn compress_file(input: &Path, output: &Path) -> std::io::Result<()> {
    let mut encoder = GzEncoder::new(BufWriter::new(File::create(output)?), Compression::default());
    std::io::copy(&mut BufReader::new(File::open(input)?), &mut encoder)?;
    encoder.finish()?.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_then_decompress() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("a.paf");
        let packed = dir.path().join("a.paf.gz");
        let unpacked = dir.path().join("b.paf");
        std::fs::write(&plain, "q\t10\t0\t10\n").unwrap();

        compress_file(&plain, &packed).unwrap();
        assert_ne!(std::fs::read(&packed).unwrap(), std::fs::read(&plain).unwrap());
        let bytes = decompress_file(&packed, &unpacked).unwrap();
        assert_eq!(bytes, 11);
        assert_eq!(std::fs::read_to_string(unpacked).unwrap(), "q\t10\t0\t10\n");
    }

    #[test]
    fn test_multi_member_stream() {
        let dir = tempfile::tempdir().unwrap();
        let mut members = Vec::new();
        for text in ["S\ts1\tA\n", "S\ts2\tC\n"] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(text.as_bytes()).unwrap();
            members.extend(encoder.finish().unwrap());
        }
        let packed = dir.path().join("g.gfa.gz");
        std::fs::write(&packed, members).unwrap();

        let unpacked = dir.path().join("g.gfa");
        decompress_file(&packed, &unpacked).unwrap();
        assert_eq!(
            std::fs::read_to_string(unpacked).unwrap(),
            "S\ts1\tA\nS\ts2\tC\n"
        );
    }

    #[test]
    fn test_not_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("x.gz");
        std::fs::write(&input, "plain text").unwrap();
        assert!(decompress_file(&input, &dir.path().join("x")).is_err());
    }
}
