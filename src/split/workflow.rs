//! Wiring the split stages into one task graph, running it and exporting the result.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::InputCatalog;
use crate::core::config::{ContigSelector, SplitConfig};
use crate::core::error::SplitError;
use crate::parsing::seqfile::SeqFile;
use crate::pipeline::executor::Executor;
use crate::pipeline::graph::{NodeId, TaskGraph};
use crate::pipeline::store::{FileId, FileStore};
use crate::split::export::{export, ExportSummary};
use crate::split::task::{FileRef, SplitContext, SplitTask, Toolchain};
use crate::utils::location::Location;

/// Scratch space multipliers, relative to input size
const DECOMPRESS_DISK_FACTOR: u64 = 10;
const MASK_DISK_FACTOR: u64 = 5;
const PARTITION_DISK_FACTOR: u64 = 5;
const SLICE_DISK_FACTOR: u64 = 3;

/// Everything a split run needs, resolved before any task runs
#[derive(Debug, Clone)]
pub struct SplitRequest {
    pub seqfile: SeqFile,
    pub graph: Location,
    pub alignment: Location,
    pub out_dir: Location,
    pub config: SplitConfig,
    pub selector: ContigSelector,
    /// Parent of the run's file store; the system temp dir when unset
    pub work_dir: Option<PathBuf>,
}

/// A graph or alignment input in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredInput {
    pub file: FileId,
    pub name: String,
    pub gzipped: bool,
    pub size: u64,
}

impl StoredInput {
    /// Import `location` into `store`
    ///
    /// # Errors
    ///
    /// Returns an IO or remote error if the input can't be imported.
    pub fn import(store: &FileStore, location: &Location) -> Result<Self, SplitError> {
        info!("Importing {location}");
        let file = store.import(location)?;
        Ok(Self {
            file,
            name: location
                .file_name()
                .unwrap_or_else(|| format!("input-{file}")),
            gzipped: location.is_gzipped(),
            size: store.size(file)?,
        })
    }

    /// Size once decompressed, estimated the same way as the disk hints
    fn expanded_size(&self) -> u64 {
        if self.gzipped {
            self.size.saturating_mul(DECOMPRESS_DISK_FACTOR)
        } else {
            self.size
        }
    }
}

fn hint(size: u64, factor: u64) -> Option<u64> {
    Some(size.saturating_mul(factor))
}

/// Add a decompression task for a gzipped input; plain inputs are used as stored
fn add_input(
    graph: &mut TaskGraph<SplitTask>,
    input: &StoredInput,
) -> Result<FileRef, SplitError> {
    if !input.gzipped {
        return Ok(FileRef::Stored(input.file));
    }
    let node = graph.add(
        SplitTask::Decompress {
            input: input.file,
            name: input.name.clone(),
        },
        hint(input.size, DECOMPRESS_DISK_FACTOR),
    )?;
    Ok(FileRef::Produced(node))
}

/// Add per-genome masking and the concatenation joining them. Returns the
/// concatenation node.
///
/// # Errors
///
/// Returns `SplitError::Consistency` if the graph rejects a task.
pub fn add_mask_tasks(
    graph: &mut TaskGraph<SplitTask>,
    catalog: &InputCatalog,
    min_length: u64,
) -> Result<NodeId, SplitError> {
    let mut parts = Vec::with_capacity(catalog.len());
    for genome in catalog.genomes() {
        parts.push(graph.add(
            SplitTask::MaskGenome {
                genome: genome.name.clone(),
                fasta: genome.file,
                min_length,
            },
            hint(genome.size, MASK_DISK_FACTOR),
        )?);
    }
    graph.add(SplitTask::ConcatMasks { parts }, None)
}

/// Build the full split graph. Returns it with the node holding the gathered table.
///
/// # Errors
///
/// Returns `SplitError::Consistency` if the graph rejects a task.
pub fn build_split_graph(
    catalog: &InputCatalog,
    graph_input: &StoredInput,
    alignment_input: &StoredInput,
    config: &SplitConfig,
) -> Result<(TaskGraph<SplitTask>, NodeId), SplitError> {
    let mut graph = TaskGraph::new();

    let graph_file = add_input(&mut graph, graph_input)?;
    let alignment_file = add_input(&mut graph, alignment_input)?;
    let mask = match config.mask_threshold() {
        Some(min_length) => Some(add_mask_tasks(&mut graph, catalog, min_length)?),
        None => None,
    };

    let partition = graph.add(
        SplitTask::Partition {
            graph: graph_file,
            alignment: alignment_file,
            mask,
        },
        hint(
            graph_input.expanded_size() + alignment_input.expanded_size(),
            PARTITION_DISK_FACTOR,
        ),
    )?;

    let mut slices = Vec::with_capacity(catalog.len());
    for genome in catalog.genomes() {
        let node = graph.add(
            SplitTask::SliceGenome {
                genome: genome.name.clone(),
                fasta: genome.file,
                gzipped: genome.gzipped,
                partition,
            },
            hint(genome.size, SLICE_DISK_FACTOR),
        )?;
        slices.push((genome.name.clone(), node));
    }

    let gather = graph.add(SplitTask::Gather { partition, slices }, None)?;
    Ok((graph, gather))
}

fn open_store(work_dir: Option<&Path>) -> Result<FileStore, SplitError> {
    Ok(match work_dir {
        Some(dir) => FileStore::new_in(dir)?,
        None => FileStore::new()?,
    })
}

/// Run a whole split: import, partition, slice, gather and export
///
/// # Errors
///
/// Returns the first configuration, tool, consistency or IO error; the run stops there.
pub fn run_split(request: SplitRequest, toolchain: Toolchain) -> Result<ExportSummary, SplitError> {
    let SplitRequest {
        seqfile,
        graph,
        alignment,
        out_dir,
        config,
        selector,
        work_dir,
    } = request;

    let store = open_store(work_dir.as_deref())?;
    let catalog = InputCatalog::build(&seqfile, &config, selector.reference.as_deref(), &store)?;
    info!("Splitting {} genomes", catalog.len());

    let graph_input = StoredInput::import(&store, &graph)?;
    let alignment_input = StoredInput::import(&store, &alignment)?;
    let (task_graph, gather) =
        build_split_graph(&catalog, &graph_input, &alignment_input, &config)?;

    let executor = Executor::new(config.max_jobs);
    let stages = task_graph.stages();
    info!(
        "Running {} tasks in {} stages with up to {} at a time",
        task_graph.len(),
        stages.len(),
        config.max_jobs
    );
    if let Some(peak) = stages
        .iter()
        .flatten()
        .filter_map(|id| task_graph.node(*id)?.disk_hint)
        .max()
    {
        debug!("Largest task scratch estimate: {peak} bytes");
    }
    let context = Arc::new(SplitContext {
        store,
        config,
        selector,
        toolchain,
    });
    let outputs = executor.run_blocking(task_graph, Arc::clone(&context))?;
    let table = outputs.get(gather)?.as_table()?;

    export(
        table,
        &catalog,
        &context.config,
        &context.selector,
        &context.store,
        &out_dir,
    )
}

/// Compute the combined mask file for every genome of `seqfile` and copy it to `output`.
/// Returns the number of genomes masked.
///
/// # Errors
///
/// Returns `SplitError::Configuration` if masking is disabled in `config`, or
/// any catalog or IO error.
pub fn run_mask(
    seqfile: &SeqFile,
    config: SplitConfig,
    output: &Path,
    work_dir: Option<&Path>,
) -> Result<usize, SplitError> {
    let min_length = config
        .mask_threshold()
        .ok_or_else(|| SplitError::configuration("mask filter must be greater than 0"))?;

    let store = open_store(work_dir)?;
    let catalog = InputCatalog::build(seqfile, &config, None, &store)?;

    let mut graph = TaskGraph::new();
    let concat = add_mask_tasks(&mut graph, &catalog, min_length)?;

    let executor = Executor::new(config.max_jobs);
    let context = Arc::new(SplitContext {
        toolchain: Toolchain::external(&config),
        store,
        config,
        selector: ContigSelector::default(),
    });
    let outputs = executor.run_blocking(graph, Arc::clone(&context))?;
    context
        .store
        .read_file(outputs.get(concat)?.as_file()?, output)?;

    info!("Wrote masked intervals of {} genomes to {}", catalog.len(), output.display());
    Ok(catalog.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::seqfile::parse_seqfile_text;
    use crate::pipeline::graph::TaskNode;

    fn catalog_fixture(store: &FileStore) -> (InputCatalog, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let g1 = dir.path().join("g1.fa");
        let mg = dir.path().join("mg.fa.gz");
        std::fs::write(&g1, ">c1\nACGTacgt\n").unwrap();
        std::fs::write(&mg, "").unwrap();
        let seqfile = parse_seqfile_text(&format!(
            "G1\t{}\n_MINIGRAPH_\t{}\n",
            g1.display(),
            mg.display()
        ))
        .unwrap();
        let catalog =
            InputCatalog::build(&seqfile, &SplitConfig::default(), None, store).unwrap();
        (catalog, dir)
    }

    fn input(store: &FileStore, name: &str, gzipped: bool) -> StoredInput {
        let scratch = store.scratch_dir("in-").unwrap();
        let path = scratch.path().join(name);
        std::fs::write(&path, "0123456789").unwrap();
        StoredInput {
            file: store.write_file(&path, name).unwrap(),
            name: name.to_string(),
            gzipped,
            size: 10,
        }
    }

    #[test]
    fn test_graph_shape_without_mask() {
        let store = FileStore::new().unwrap();
        let (catalog, _dir) = catalog_fixture(&store);
        let gfa = input(&store, "mg.gfa", false);
        let paf = input(&store, "mg.paf", false);

        let (graph, gather) =
            build_split_graph(&catalog, &gfa, &paf, &SplitConfig::default()).unwrap();
        // partition, two slices, gather
        assert_eq!(graph.len(), 4);
        let stages = graph.stages();
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[2], vec![gather]);
        assert_eq!(graph.node(gather).unwrap().dependencies.len(), 3);
        assert_eq!(graph.node(stages[0][0]).unwrap().disk_hint, Some(100));
    }

    #[test]
    fn test_graph_shape_with_mask_and_gzip() {
        let store = FileStore::new().unwrap();
        let (catalog, _dir) = catalog_fixture(&store);
        let gfa = input(&store, "mg.gfa.gz", true);
        let paf = input(&store, "mg.paf", false);
        let config = SplitConfig {
            mask_filter: Some(5),
            ..SplitConfig::default()
        };

        let (graph, _) = build_split_graph(&catalog, &gfa, &paf, &config).unwrap();
        // decompress, 2 masks, concat, partition, 2 slices, gather
        assert_eq!(graph.len(), 8);

        let (_, node) = graph
            .into_nodes()
            .find(|(_, node)| node.task.describe() == "partition")
            .unwrap();
        assert_eq!(node.dependencies.len(), 2);
        // (10 * 10 + 10) * 5
        assert_eq!(node.disk_hint, Some(550));
    }

    #[test]
    fn test_mask_requires_threshold() {
        let seqfile = parse_seqfile_text("_MINIGRAPH_\tmg.fa\n").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = run_mask(
            &seqfile,
            SplitConfig::default(),
            &dir.path().join("out.bed"),
            None,
        );
        assert!(matches!(result, Err(SplitError::Configuration(_))));
    }
}
