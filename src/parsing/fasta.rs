//! FASTA reading and writing using noodles.
//!
//! Supports both uncompressed and gzip/bgzip compressed input. Output can be
//! gzip-compressed to mirror a compressed source.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use noodles::fasta;

use crate::parsing::ParseError;
use crate::utils::location::is_gzipped_name;

/// Open a possibly gzip-compressed file for buffered reading.
///
/// Compression is detected from the file name. bgzip files are multi-member gzip
/// streams, so a multi-member decoder is used.
///
/// # Errors
///
/// Returns an IO error if the file cannot be opened.
pub fn open_reader(path: &Path) -> std::io::Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    let gzipped = path
        .file_name()
        .is_some_and(|n| is_gzipped_name(&n.to_string_lossy()));
    if gzipped {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Open a FASTA file as a noodles reader
///
/// # Errors
///
/// Returns an IO error if the file cannot be opened.
pub fn open_fasta(path: &Path) -> std::io::Result<fasta::io::Reader<Box<dyn BufRead + Send>>> {
    Ok(fasta::io::Reader::new(open_reader(path)?))
}

/// Visit every record of a FASTA reader as `(name, sequence)`
///
/// # Errors
///
/// Returns `ParseError::Noodles` if a record is malformed, or whatever error the
/// visitor returns.
pub fn for_each_record<R, F, E>(reader: &mut fasta::io::Reader<R>, mut visit: F) -> Result<(), E>
where
    R: BufRead,
    F: FnMut(&str, &[u8]) -> Result<(), E>,
    E: From<ParseError>,
{
    for result in reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;
        let name = String::from_utf8_lossy(record.name()).to_string();
        visit(&name, record.sequence().as_ref())?;
    }
    Ok(())
}

/// Write the named records of a FASTA file, in the order the names are given.
///
/// This is the whole-sequence subset of `samtools faidx --region-file`. When
/// `compress` is set the output is gzip-compressed. Returns the number of
/// residues written.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a requested name is not in the FASTA,
/// or an IO/noodles error if reading or writing fails.
pub fn extract_records<W: Write>(
    input: &Path,
    names: &[String],
    output: W,
    compress: bool,
) -> Result<u64, ParseError> {
    let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
    let mut found: HashMap<String, fasta::Record> = HashMap::with_capacity(wanted.len());

    let mut reader = open_fasta(input)?;
    for result in reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;
        let name = String::from_utf8_lossy(record.name()).to_string();
        if wanted.contains(name.as_str()) {
            found.insert(name, record);
        }
    }

    if compress {
        let mut encoder = GzEncoder::new(output, Compression::default());
        let residues = write_selected(&mut encoder, input, names, &found)?;
        encoder.finish()?;
        Ok(residues)
    } else {
        let mut output = output;
        let residues = write_selected(&mut output, input, names, &found)?;
        output.flush()?;
        Ok(residues)
    }
}

fn write_selected<W: Write>(
    output: W,
    input: &Path,
    names: &[String],
    found: &HashMap<String, fasta::Record>,
) -> Result<u64, ParseError> {
    let mut writer = fasta::io::Writer::new(output);
    let mut residues = 0;
    for name in names {
        let record = found.get(name).ok_or_else(|| {
            ParseError::InvalidFormat(format!(
                "sequence '{name}' not found in {}",
                input.display()
            ))
        })?;
        residues += record.sequence().len() as u64;
        writer.write_record(record)?;
    }
    Ok(residues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::NamedTempFile;

    fn write_fasta(content: &[u8], suffix: &str) -> NamedTempFile {
        let mut temp = NamedTempFile::with_suffix(suffix).unwrap();
        if suffix.ends_with(".gz") {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(content).unwrap();
            temp.write_all(&encoder.finish().unwrap()).unwrap();
        } else {
            temp.write_all(content).unwrap();
        }
        temp.flush().unwrap();
        temp
    }

    fn collect(path: &Path) -> Vec<(String, Vec<u8>)> {
        let mut reader = open_fasta(path).unwrap();
        let mut records = Vec::new();
        for_each_record::<_, _, ParseError>(&mut reader, |name, seq| {
            records.push((name.to_string(), seq.to_vec()));
            Ok(())
        })
        .unwrap();
        records
    }

    #[test]
    fn test_read_plain_and_gzipped() {
        let content = b">chr1 description\nACGTacgt\nNNNN\n>chr2\nGGGG\n";
        for suffix in [".fa", ".fa.gz"] {
            let temp = write_fasta(content, suffix);
            let records = collect(temp.path());
            assert_eq!(records.len(), 2);
            assert_eq!(records[0].0, "chr1");
            assert_eq!(records[0].1, b"ACGTacgtNNNN");
            assert_eq!(records[1].0, "chr2");
        }
    }

    #[test]
    fn test_extract_records_in_requested_order() {
        let temp = write_fasta(b">a\nAAAA\n>b\nCC\n>c\nGGG\n", ".fa");
        let mut out = Vec::new();
        let names = vec!["c".to_string(), "a".to_string()];
        let residues = extract_records(temp.path(), &names, &mut out, false).unwrap();
        assert_eq!(residues, 7);
        assert_eq!(String::from_utf8(out).unwrap(), ">c\nGGG\n>a\nAAAA\n");
    }

    #[test]
    fn test_extract_records_compressed() {
        let temp = write_fasta(b">a\nAAAA\n>b\nCC\n", ".fa.gz");
        let mut out = Vec::new();
        extract_records(temp.path(), &["b".to_string()], &mut out, true).unwrap();

        let mut text = String::new();
        MultiGzDecoder::new(out.as_slice())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, ">b\nCC\n");
    }

    #[test]
    fn test_extract_missing_record() {
        let temp = write_fasta(b">a\nAAAA\n", ".fa");
        let result = extract_records(temp.path(), &["zz".to_string()], Vec::new(), false);
        assert!(matches!(result, Err(ParseError::InvalidFormat(_))));
    }
}
