//! Soft-masked interval extraction.
//!
//! A residue is masked when it is lowercase or `N`. Runs of masked residues at
//! least `min_length` long are reported so the partitioner can ignore alignments
//! that land in them.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::SplitError;
use crate::core::types::QualifiedId;
use crate::parsing::bed::{parse_bed_text, MaskInterval};
use crate::parsing::fasta::{for_each_record, open_fasta};

#[must_use]
pub fn is_masked(residue: u8) -> bool {
    residue.is_ascii_lowercase() || residue == b'N'
}

/// Half-open `[start, end)` runs of masked residues with `end - start >= min_length`.
///
/// A run ends at the first unmasked residue, or at the end of the sequence.
#[must_use]
pub fn masked_runs(sequence: &[u8], min_length: u64) -> Vec<(u64, u64)> {
    let mut runs = Vec::new();
    let mut open: Option<u64> = None;

    for (i, &residue) in sequence.iter().enumerate() {
        let i = i as u64;
        match (is_masked(residue), open) {
            (true, None) => open = Some(i),
            (false, Some(start)) => {
                if i - start >= min_length {
                    runs.push((start, i));
                }
                open = None;
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        let end = sequence.len() as u64;
        if end - start >= min_length {
            runs.push((start, end));
        }
    }

    runs
}

/// Write the masked intervals of every record in `fasta` as
/// `id=<genome>|<record>\t<start>\t<end>` rows. Returns the number of rows.
///
/// # Errors
///
/// Returns an IO or parse error if the FASTA cannot be read or the output written.
pub fn write_mask_bed<W: Write>(
    genome: &str,
    fasta: &Path,
    min_length: u64,
    output: W,
) -> Result<usize, SplitError> {
    let mut reader = open_fasta(fasta)?;
    let mut writer = BufWriter::new(output);
    let mut count = 0;

    for_each_record::<_, _, SplitError>(&mut reader, |name, sequence| {
        for (start, end) in masked_runs(sequence, min_length) {
            let interval = MaskInterval {
                id: QualifiedId::new(genome, name),
                start,
                end,
            };
            writeln!(writer, "{interval}")?;
            count += 1;
        }
        Ok(())
    })?;

    writer.flush()?;
    debug!("{genome}: {count} masked intervals of at least {min_length} bp");
    Ok(count)
}

/// Concatenate files in order into `output`
///
/// # Errors
///
/// Returns an IO error if any input cannot be read or the output written.
pub fn concat_files(inputs: &[PathBuf], output: &Path) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(output)?);
    for input in inputs {
        std::io::copy(&mut File::open(input)?, &mut out)?;
    }
    out.flush()
}

/// Count the intervals of a combined mask file and the bases they cover
///
/// # Errors
///
/// Returns an IO error if the file can't be read, or `SplitError::Parse` if a
/// row is malformed.
pub fn mask_summary(path: &Path) -> Result<(usize, u64), SplitError> {
    let intervals = parse_bed_text(&std::fs::read_to_string(path)?)?;
    let bases = intervals.iter().map(MaskInterval::span).sum();
    Ok((intervals.len(), bases))
}
