//! The input catalog: which genomes take part in a split and where their
//! sequences live.
//!
//! The catalog is built from a seqfile before any task runs. Only leaves of the
//! seqfile's tree are kept (every listed genome when there is no tree), names
//! are validated for use in output paths, and each sequence is brought into the
//! file store: local files are registered in place, URLs are downloaded, and
//! directories are concatenated into a single FASTA.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrom_split::catalog::InputCatalog;
//! use chrom_split::core::config::SplitConfig;
//! use chrom_split::parsing::seqfile::parse_seqfile;
//! use chrom_split::pipeline::store::FileStore;
//! use std::path::Path;
//!
//! let seqfile = parse_seqfile(Path::new("pangenome.seqfile")).unwrap();
//! let store = FileStore::new().unwrap();
//! let catalog = InputCatalog::build(&seqfile, &SplitConfig::default(), Some("CHM13"), &store).unwrap();
//! for genome in catalog.genomes() {
//!     println!("{}\t{}", genome.name, genome.source);
//! }
//! ```

pub mod input;

pub use input::{Genome, InputCatalog};
