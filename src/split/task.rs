//! The tasks of a split run and the state they share.

use std::collections::BTreeMap;
use std::fs::File;

use tracing::{debug, info};

use crate::core::config::{ContigSelector, SplitConfig};
use crate::core::error::SplitError;
use crate::pipeline::executor::{Runnable, TaskInputs};
use crate::pipeline::graph::{NodeId, TaskNode};
use crate::pipeline::store::{FileId, FileStore};
use crate::split::gather::{gather, GatheredTable};
use crate::split::gzip::decompress_file;
use crate::split::mask::{concat_files, mask_summary, write_mask_bed};
use crate::split::partition::{run_partition, ContigPartitioner, PartitionMap, RgfaSplit};
use crate::split::slice::{slice_genome, NativeExtractor, RegionExtractor, SamtoolsFaidx, SliceMap};
use crate::utils::location::strip_gz_suffix;

/// The external programs a run calls out to
pub struct Toolchain {
    pub partitioner: Box<dyn ContigPartitioner>,
    pub extractor: Box<dyn RegionExtractor>,
}

impl Toolchain {
    /// `rgfa-split` and `samtools` at the paths named in `config`
    #[must_use]
    pub fn external(config: &SplitConfig) -> Self {
        Self {
            partitioner: Box::new(RgfaSplit::new(&config.partition_tool)),
            extractor: Box::new(SamtoolsFaidx::new(&config.samtools)),
        }
    }

    /// Swap samtools for the built-in extractor
    #[must_use]
    pub fn with_native_extractor(mut self) -> Self {
        self.extractor = Box::new(NativeExtractor);
        self
    }
}

/// Read-only state shared by every task of a run
pub struct SplitContext {
    pub store: FileStore,
    pub config: SplitConfig,
    pub selector: ContigSelector,
    pub toolchain: Toolchain,
}

/// A file that is either already stored or produced by an earlier task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRef {
    Stored(FileId),
    Produced(NodeId),
}

impl FileRef {
    fn resolve(self, inputs: &TaskInputs<TaskOutput>) -> Result<FileId, SplitError> {
        match self {
            Self::Stored(id) => Ok(id),
            Self::Produced(node) => inputs.get(node)?.as_file(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitTask {
    /// Gunzip a graph or alignment input
    Decompress { input: FileId, name: String },

    /// Write one genome's masked intervals
    MaskGenome {
        genome: String,
        fasta: FileId,
        min_length: u64,
    },

    /// Join the per-genome interval files, in the order given
    ConcatMasks { parts: Vec<NodeId> },

    /// Run the contig partitioner
    Partition {
        graph: FileRef,
        alignment: FileRef,
        mask: Option<NodeId>,
    },

    /// Cut one genome by label
    SliceGenome {
        genome: String,
        fasta: FileId,
        gzipped: bool,
        partition: NodeId,
    },

    /// Join the partition with every genome's slices
    Gather {
        partition: NodeId,
        slices: Vec<(String, NodeId)>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutput {
    File(FileId),
    Partition(PartitionMap),
    Slices(SliceMap),
    Table(GatheredTable),
}

impl TaskOutput {
    fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Partition(_) => "partition",
            Self::Slices(_) => "slice map",
            Self::Table(_) => "table",
        }
    }

    fn mismatch(&self, wanted: &str) -> SplitError {
        SplitError::consistency(format!("expected a {wanted}, got a {}", self.kind()))
    }

    /// # Errors
    ///
    /// Returns `SplitError::Consistency` for any other kind of output.
    pub fn as_file(&self) -> Result<FileId, SplitError> {
        match self {
            Self::File(id) => Ok(*id),
            other => Err(other.mismatch("file")),
        }
    }

    /// # Errors
    ///
    /// Returns `SplitError::Consistency` for any other kind of output.
    pub fn as_partition(&self) -> Result<&PartitionMap, SplitError> {
        match self {
            Self::Partition(map) => Ok(map),
            other => Err(other.mismatch("partition")),
        }
    }

    /// # Errors
    ///
    /// Returns `SplitError::Consistency` for any other kind of output.
    pub fn as_slices(&self) -> Result<&SliceMap, SplitError> {
        match self {
            Self::Slices(map) => Ok(map),
            other => Err(other.mismatch("slice map")),
        }
    }

    /// # Errors
    ///
    /// Returns `SplitError::Consistency` for any other kind of output.
    pub fn as_table(&self) -> Result<&GatheredTable, SplitError> {
        match self {
            Self::Table(table) => Ok(table),
            other => Err(other.mismatch("table")),
        }
    }
}

impl TaskNode for SplitTask {
    fn dependencies(&self) -> Vec<NodeId> {
        match self {
            Self::Decompress { .. } | Self::MaskGenome { .. } => Vec::new(),
            Self::ConcatMasks { parts } => parts.clone(),
            Self::Partition {
                graph,
                alignment,
                mask,
            } => [*graph, *alignment]
                .into_iter()
                .filter_map(|r| match r {
                    FileRef::Produced(node) => Some(node),
                    FileRef::Stored(_) => None,
                })
                .chain(*mask)
                .collect(),
            Self::SliceGenome { partition, .. } => vec![*partition],
            Self::Gather { partition, slices } => std::iter::once(*partition)
                .chain(slices.iter().map(|(_, node)| *node))
                .collect(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Decompress { name, .. } => format!("decompress {name}"),
            Self::MaskGenome { genome, .. } => format!("mask {genome}"),
            Self::ConcatMasks { parts } => format!("concatenate {} mask files", parts.len()),
            Self::Partition { .. } => "partition".to_string(),
            Self::SliceGenome { genome, .. } => format!("slice {genome}"),
            Self::Gather { slices, .. } => format!("gather {} genomes", slices.len()),
        }
    }
}

impl Runnable for SplitTask {
    type Context = SplitContext;
    type Output = TaskOutput;

    fn run(
        &self,
        context: &SplitContext,
        inputs: &TaskInputs<TaskOutput>,
    ) -> Result<TaskOutput, SplitError> {
        let store = &context.store;
        match self {
            Self::Decompress { input, name } => {
                let scratch = store.scratch_dir("gunzip-")?;
                let plain = strip_gz_suffix(name);
                let path = scratch.path().join(plain);
                let bytes = decompress_file(&store.path(*input)?, &path)?;
                debug!("Decompressed {name}: {bytes} bytes");
                Ok(TaskOutput::File(store.write_file(&path, plain)?))
            }

            Self::MaskGenome {
                genome,
                fasta,
                min_length,
            } => {
                let scratch = store.scratch_dir("mask-")?;
                let name = format!("{genome}.mask.bed");
                let path = scratch.path().join(&name);
                write_mask_bed(genome, &store.path(*fasta)?, *min_length, File::create(&path)?)?;
                Ok(TaskOutput::File(store.write_file(&path, &name)?))
            }

            Self::ConcatMasks { parts } => {
                let paths = parts
                    .iter()
                    .map(|node| store.path(inputs.get(*node)?.as_file()?))
                    .collect::<Result<Vec<_>, _>>()?;
                let scratch = store.scratch_dir("mask-")?;
                let path = scratch.path().join("mask.bed");
                concat_files(&paths, &path)?;
                let (intervals, bases) = mask_summary(&path)?;
                info!("Hiding {intervals} masked intervals ({bases} bp) from the partitioner");
                Ok(TaskOutput::File(store.write_file(&path, "mask.bed")?))
            }

            Self::Partition {
                graph,
                alignment,
                mask,
            } => {
                let (graph, alignment) = (graph.resolve(inputs)?, alignment.resolve(inputs)?);
                debug!(
                    "Partitioning {} with {}",
                    store.name(graph)?,
                    store.name(alignment)?
                );
                let graph = store.path(graph)?;
                let alignment = store.path(alignment)?;
                let mask = match mask {
                    Some(node) => Some(store.path(inputs.get(*node)?.as_file()?)?),
                    None => None,
                };
                let partition = run_partition(
                    context.toolchain.partitioner.as_ref(),
                    &graph,
                    &alignment,
                    mask.as_deref(),
                    &context.config,
                    &context.selector,
                    store,
                )?;
                Ok(TaskOutput::Partition(partition))
            }

            Self::SliceGenome {
                genome,
                fasta,
                gzipped,
                partition,
            } => {
                let partition = inputs.get(*partition)?.as_partition()?;
                let slices = slice_genome(
                    context.toolchain.extractor.as_ref(),
                    genome,
                    &store.path(*fasta)?,
                    *gzipped,
                    partition,
                    store,
                )?;
                Ok(TaskOutput::Slices(slices))
            }

            Self::Gather { partition, slices } => {
                let partition = inputs.get(*partition)?.as_partition()?;
                let mut by_genome = BTreeMap::new();
                for (genome, node) in slices {
                    by_genome.insert(genome.clone(), inputs.get(*node)?.as_slices()?.clone());
                }
                Ok(TaskOutput::Table(gather(partition, &by_genome)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::graph::TaskGraph;

    #[test]
    fn test_partition_dependencies() {
        let mut graph: TaskGraph<SplitTask> = TaskGraph::new();
        let store = FileStore::new().unwrap();
        let scratch = store.scratch_dir("t-").unwrap();
        let path = scratch.path().join("x.gfa.gz");
        std::fs::write(&path, "").unwrap();
        let input = store.write_file(&path, "x.gfa.gz").unwrap();

        let gfa = graph
            .add(
                SplitTask::Decompress {
                    input,
                    name: "x.gfa.gz".to_string(),
                },
                None,
            )
            .unwrap();
        let task = SplitTask::Partition {
            graph: FileRef::Produced(gfa),
            alignment: FileRef::Stored(input),
            mask: None,
        };
        assert_eq!(task.dependencies(), vec![gfa]);
        assert_eq!(task.describe(), "partition");
    }

    #[test]
    fn test_output_accessors() {
        let output = TaskOutput::Partition(PartitionMap::new());
        assert!(output.as_partition().is_ok());
        assert!(matches!(
            output.as_file(),
            Err(SplitError::Consistency(msg)) if msg.contains("partition")
        ));
        assert!(output.as_table().is_err());
    }
}
