//! # chrom-split
//!
//! A library for splitting whole-genome pangenome alignments into independent
//! per-chromosome bundles.
//!
//! Aligning many genomes at once is expensive and hard to parallelize. Given a
//! reference graph (rGFA), the alignment of every genome's contigs to it (PAF)
//! and the genomes' FASTA files, `chrom-split` assigns every contig to a
//! reference chromosome and writes one self-contained bundle per chromosome so
//! downstream alignment can run one chromosome at a time.
//!
//! ## Features
//!
//! - **Contig partitioning**: Drives `rgfa-split` with coverage and uniqueness thresholds
//! - **Masking**: Optionally hides long soft-masked runs from the partitioner
//! - **Parallel slicing**: Genomes are cut by chromosome concurrently
//! - **Explicit task graph**: Every stage is a node with declared inputs, run fail-fast
//! - **Remote inputs and outputs**: Any locator may be an `http(s)://` URL
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrom_split::core::config::{ContigSelector, SplitConfig};
//! use chrom_split::parsing::seqfile::parse_seqfile;
//! use chrom_split::split::{run_split, SplitRequest, Toolchain};
//! use chrom_split::utils::location::Location;
//! use std::path::Path;
//!
//! let config = SplitConfig::default();
//! let selector = ContigSelector::new(
//!     vec!["chr1".to_string(), "chr2".to_string()],
//!     Some("chrOther".to_string()),
//!     Some("CHM13".to_string()),
//! )
//! .unwrap();
//!
//! let request = SplitRequest {
//!     seqfile: parse_seqfile(Path::new("pangenome.seqfile")).unwrap(),
//!     graph: Location::parse("mg.gfa.gz").unwrap(),
//!     alignment: Location::parse("mg.paf").unwrap(),
//!     out_dir: Location::parse("split-out").unwrap(),
//!     selector,
//!     work_dir: None,
//!     config: config.clone(),
//! };
//! let summary = run_split(request, Toolchain::external(&config)).unwrap();
//! println!("{} chromosomes, manifest at {}", summary.labels, summary.chromfile);
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Genomes taking part in a run and their sequences
//! - [`core`]: Configuration, errors, and shared identifier types
//! - [`parsing`]: Parsers for seqfiles, Newick trees, FASTA, and interval files
//! - [`pipeline`]: Task graph, executor, and write-once file store
//! - [`split`]: The split stages and workflow
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod core;
pub mod parsing;
pub mod pipeline;
pub mod split;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::{Genome, InputCatalog};
pub use core::config::{ContigSelector, SplitConfig};
pub use core::error::SplitError;
pub use core::types::*;
pub use split::{run_mask, run_split, ExportSummary, SplitRequest, Toolchain};
