//! Command-line interface for chrom-split.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **split**: Split a graph, alignment and genomes into per-chromosome bundles
//! - **mask**: Write the soft-masked intervals `split --mask-filter` would hide
//!
//! ## Usage
//!
//! ```text
//! # Split by the reference's chromosomes, pooling the rest
//! chrom-split split pangenome.seqfile mg.gfa.gz mg.paf --out-dir out/ \
//!     --ref-contigs chr1 chr2 chr3 --other-contig chrOther --reference CHM13
//!
//! # Take the contig list from a file and ignore masked runs of 100kb or more
//! chrom-split split pangenome.seqfile mg.gfa mg.paf --out-dir out/ \
//!     --ref-contigs-file contigs.txt --mask-filter 100000
//!
//! # Inspect the masked intervals
//! chrom-split mask pangenome.seqfile mask.bed --mask-filter 100000
//! ```

use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::core::config::SplitConfig;

pub mod mask;
pub mod split;

#[derive(Parser)]
#[command(name = "chrom-split")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Split whole-genome graph alignments into per-chromosome bundles")]
#[command(
    long_about = "chrom-split partitions a reference graph (GFA), the alignment of every genome to it (PAF) and the genomes' FASTA files by reference chromosome.\n\nEach chromosome gets its own directory with a sub-graph, sub-alignment and one FASTA per genome, plus a seqfile, so downstream alignment can run one chromosome at a time."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for the run summary
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a graph, alignment and genomes by reference chromosome
    Split(split::SplitArgs),

    /// Write soft-masked intervals of every genome in a seqfile
    Mask(mask::MaskArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Load the config file, if any, and layer command-line overrides on top
///
/// # Errors
///
/// Returns an error if the config file can't be loaded or `max_jobs` is 0.
pub fn resolve_config(
    config_file: Option<&Path>,
    mask_filter: Option<u64>,
    max_jobs: Option<usize>,
) -> anyhow::Result<SplitConfig> {
    let mut config = match config_file {
        Some(path) => SplitConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SplitConfig::default(),
    };
    if let Some(n) = mask_filter {
        config.mask_filter = Some(n);
    }
    if let Some(jobs) = max_jobs {
        anyhow::ensure!(jobs > 0, "--max-jobs must be at least 1");
        config.max_jobs = jobs;
    }
    Ok(config)
}
