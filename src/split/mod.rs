//! The split workflow.
//!
//! A run turns a whole-genome graph, alignment and set of genome FASTAs into one
//! bundle per chromosome:
//!
//! 1. gzipped graph/alignment inputs are decompressed, and (optionally) every
//!    genome's soft-masked runs are written to one combined interval file
//! 2. [`partition`] runs the contig partitioner, producing a graph, alignment and
//!    contig list per label
//! 3. [`slice`] cuts every genome into one FASTA per label, in parallel
//! 4. [`gather`] joins the partition and the slices into a table keyed by label
//! 5. [`export`] writes the table out as directories plus seqfile/chromfile manifests
//!
//! Steps 1-4 are tasks of one [`crate::pipeline`] graph, built in [`workflow`].

pub mod export;
pub mod gather;
pub mod gzip;
pub mod mask;
pub mod partition;
pub mod slice;
pub mod task;
pub mod tool;
pub mod workflow;

pub use export::ExportSummary;
pub use task::Toolchain;
pub use workflow::{run_mask, run_split, SplitRequest};
