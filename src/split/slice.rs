//! Per-genome sequence slicing.
//!
//! For every label, the partitioner's contig list is filtered down to the
//! genome's own sequences and those sequences are pulled out of the genome FASTA.
//! A genome with nothing under a label still gets a (zero-byte) file for it, so
//! every slice map has the same keys as the partition.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::core::error::SplitError;
use crate::core::types::{ChromLabel, QualifiedId};
use crate::parsing::fasta::extract_records;
use crate::pipeline::store::{FileId, FileStore};
use crate::split::gzip::{compress_file, decompress_file};
use crate::split::partition::PartitionMap;
use crate::split::tool::run_tool;

/// One genome's slices, keyed by label
pub type SliceMap = BTreeMap<ChromLabel, FileId>;

/// Something that pulls named sequences out of an uncompressed FASTA
pub trait RegionExtractor: Send + Sync {
    /// Write the sequences listed in `regions` (one name per line) from `fasta`
    /// to `output`, gzip-compressed when `compress` is set.
    ///
    /// # Errors
    ///
    /// Any error is fatal to the run.
    fn extract(
        &self,
        fasta: &Path,
        regions: &Path,
        output: &Path,
        compress: bool,
    ) -> Result<(), SplitError>;
}

/// `samtools faidx <fasta> --region-file <list>`
#[derive(Debug, Clone)]
pub struct SamtoolsFaidx {
    binary: PathBuf,
}

impl SamtoolsFaidx {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl RegionExtractor for SamtoolsFaidx {
    fn extract(
        &self,
        fasta: &Path,
        regions: &Path,
        output: &Path,
        compress: bool,
    ) -> Result<(), SplitError> {
        let dir = output.parent().unwrap_or_else(|| Path::new("."));
        let plain = tempfile::NamedTempFile::new_in(dir)?;

        let mut command = Command::new(&self.binary);
        command
            .arg("faidx")
            .arg(fasta)
            .arg("--region-file")
            .arg(regions)
            .stdout(Stdio::from(plain.reopen()?));
        run_tool("samtools", &mut command)?;

        if compress {
            compress_file(plain.path(), output)?;
        } else {
            plain.persist(output).map_err(|e| SplitError::Io(e.error))?;
        }
        Ok(())
    }
}

/// Built-in extractor for whole-sequence regions
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeExtractor;

impl RegionExtractor for NativeExtractor {
    fn extract(
        &self,
        fasta: &Path,
        regions: &Path,
        output: &Path,
        compress: bool,
    ) -> Result<(), SplitError> {
        let names: Vec<String> = std::fs::read_to_string(regions)?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        let residues = extract_records(fasta, &names, File::create(output)?, compress)?;
        debug!("Extracted {} sequences ({residues} bp) from {}", names.len(), fasta.display());
        Ok(())
    }
}

/// Keep the entries of a contig list that belong to `genome`, without their prefix
#[must_use]
pub fn clean_region_list(text: &str, genome: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| QualifiedId::strip_genome(line.trim(), genome))
        .map(str::to_string)
        .collect()
}

/// Output name of a genome's slice for a label
#[must_use]
pub fn slice_file_name(genome: &str, label: &ChromLabel, gzipped: bool) -> String {
    if gzipped {
        format!("{genome}_{label}.fa.gz")
    } else {
        format!("{genome}_{label}.fa")
    }
}

/// Cut one genome into a slice per label of `partition`
///
/// # Errors
///
/// Returns the extractor's error, or an IO error while preparing inputs or
/// storing outputs.
pub fn slice_genome(
    extractor: &dyn RegionExtractor,
    genome: &str,
    fasta: &Path,
    gzipped: bool,
    partition: &PartitionMap,
    store: &FileStore,
) -> Result<SliceMap, SplitError> {
    let scratch = store.scratch_dir("slice-")?;

    // The extractor works on an uncompressed copy in scratch, which also keeps
    // any index it builds away from the input
    let local = scratch.path().join(format!("{genome}.fa"));
    if gzipped {
        decompress_file(fasta, &local)?;
    } else if std::fs::hard_link(fasta, &local).is_err() {
        std::fs::copy(fasta, &local)?;
    }

    let mut slices = SliceMap::new();
    for (label, artifacts) in partition {
        let regions = match artifacts.contigs {
            Some(list) => clean_region_list(&std::fs::read_to_string(store.path(list)?)?, genome),
            None => Vec::new(),
        };

        let name = slice_file_name(genome, label, gzipped);
        let output = scratch.path().join(&name);
        if regions.is_empty() {
            File::create(&output)?;
        } else {
            let list = scratch.path().join(format!("{label}.fa_contigs.clean"));
            std::fs::write(&list, regions.join("\n") + "\n")?;
            extractor.extract(&local, &list, &output, gzipped)?;
        }
        debug!("{genome}: {} sequences under {label}", regions.len());

        slices.insert(label.clone(), store.write_file(&output, &name)?);
    }

    info!("Sliced {genome} into {} labels", slices.len());
    Ok(slices)
}
