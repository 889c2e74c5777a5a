//! Parsers for the text formats a split run reads and writes.
//!
//! This module provides parsers for:
//!
//! - **FASTA files**: plain or gzip/bgzip compressed, read and written with noodles
//! - **Sequence manifests (seqfiles)**: an optional Newick tree followed by `name path` rows
//! - **Newick trees**: only leaf names are extracted
//! - **Mask BED files**: `id=<genome>|<contig>\t<start>\t<end>` rows
//! - **Contig lists**: one contig per line, as passed to `--ref-contigs-file` or written
//!   by the partitioner as `.fa_contigs`
//!
//! ## Example
//!
//! ```rust
//! use chrom_split::parsing::seqfile::parse_seqfile_text;
//!
//! let seqfile = parse_seqfile_text("(G1,G2);\nG1\t/data/g1.fa\nG2\t/data/g2.fa.gz\n").unwrap();
//! assert_eq!(seqfile.leaves().unwrap(), vec!["G1", "G2"]);
//! ```

use thiserror::Error;

pub mod bed;
pub mod contigs;
pub mod fasta;
pub mod newick;
pub mod seqfile;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),
}
