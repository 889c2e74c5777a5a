//! Contig partitioning: assign every alignment record and graph segment to a
//! chromosome label.
//!
//! The work is done by an external partitioner (`rgfa-split`). It writes
//! `<prefix><label>.<ext>` files into its working directory, one of each
//! [`ArtifactKind`] per label, which are then collected into the file store.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::core::config::{ContigSelector, SplitConfig};
use crate::core::error::SplitError;
use crate::core::types::{ChromLabel, QualifiedId};
use crate::pipeline::store::{FileId, FileStore};
use crate::split::tool::run_tool;
use crate::utils::validation::validate_name;

/// File name prefix the partitioner is asked to use for its outputs
pub const OUTPUT_PREFIX: &str = "split_";

/// The kinds of file the partitioner writes for a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// Sub-graph (`.gfa`); never written for the ambiguous label
    Graph,
    /// Sub-alignment (`.paf`)
    Alignment,
    /// Genome-qualified sequence names assigned to the label (`.fa_contigs`)
    ContigList,
}

impl ArtifactKind {
    pub const ALL: [Self; 3] = [Self::Graph, Self::Alignment, Self::ContigList];

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Graph => "gfa",
            Self::Alignment => "paf",
            Self::ContigList => "fa_contigs",
        }
    }

    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.extension() == ext)
    }
}

/// The files the partitioner produced for one label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelArtifacts<F> {
    pub graph: Option<F>,
    pub alignment: Option<F>,
    pub contigs: Option<F>,
}

impl<F> Default for LabelArtifacts<F> {
    fn default() -> Self {
        Self {
            graph: None,
            alignment: None,
            contigs: None,
        }
    }
}

impl<F> LabelArtifacts<F> {
    #[must_use]
    pub fn get(&self, kind: ArtifactKind) -> Option<&F> {
        match kind {
            ArtifactKind::Graph => self.graph.as_ref(),
            ArtifactKind::Alignment => self.alignment.as_ref(),
            ArtifactKind::ContigList => self.contigs.as_ref(),
        }
    }

    pub fn set(&mut self, kind: ArtifactKind, file: F) {
        let slot = match kind {
            ArtifactKind::Graph => &mut self.graph,
            ArtifactKind::Alignment => &mut self.alignment,
            ArtifactKind::ContigList => &mut self.contigs,
        };
        *slot = Some(file);
    }
}

/// Partitioner output in the file store, keyed by label
pub type PartitionMap = BTreeMap<ChromLabel, LabelArtifacts<FileId>>;

/// Everything a partitioner needs for one run
#[derive(Debug, Clone, Copy)]
pub struct PartitionRequest<'a> {
    pub graph: &'a Path,
    pub alignment: &'a Path,
    pub mask_bed: Option<&'a Path>,
    /// Output prefix; its parent is the working directory
    pub out_prefix: &'a Path,
    pub config: &'a SplitConfig,
    pub selector: &'a ContigSelector,
}

impl PartitionRequest<'_> {
    /// Command-line arguments in the form `rgfa-split` expects
    #[must_use]
    pub fn args(&self) -> Vec<OsString> {
        let config = self.config;
        let mut args: Vec<OsString> = vec![
            "-i".into(),
            QualifiedId::genome_prefix(&config.graph_event).into(),
            "-G".into(),
            "-g".into(),
            self.graph.into(),
            "-p".into(),
            self.alignment.into(),
            "-b".into(),
            self.out_prefix.into(),
            "-n".into(),
            config.min_query_coverage.to_string().into(),
            "-N".into(),
            config.min_query_small_coverage.to_string().into(),
            "-T".into(),
            config.min_query_small_threshold.to_string().into(),
            "-Q".into(),
            config.min_query_uniqueness.to_string().into(),
            "-a".into(),
            config.ambiguous_name.clone().into(),
        ];
        if let Some(other) = &self.selector.other {
            args.extend(["-o".into(), other.into()]);
        }
        if let Some(reference) = &self.selector.reference {
            args.extend(["-r".into(), QualifiedId::genome_prefix(reference).into()]);
        }
        if let Some(bed) = self.mask_bed {
            args.extend(["-B".into(), bed.into()]);
        }
        for contig in &self.selector.contigs {
            args.extend(["-c".into(), contig.into()]);
        }
        args
    }

    /// Directory the partitioner writes into
    #[must_use]
    pub fn work_dir(&self) -> &Path {
        self.out_prefix.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Something that splits a graph and alignment by chromosome
pub trait ContigPartitioner: Send + Sync {
    /// Write `<out_prefix><label>.<ext>` files for every label
    ///
    /// # Errors
    ///
    /// Any error is fatal to the run.
    fn partition(&self, request: &PartitionRequest<'_>) -> Result<(), SplitError>;
}

/// The `rgfa-split` binary
#[derive(Debug, Clone)]
pub struct RgfaSplit {
    binary: PathBuf,
}

impl RgfaSplit {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl ContigPartitioner for RgfaSplit {
    fn partition(&self, request: &PartitionRequest<'_>) -> Result<(), SplitError> {
        let mut command = Command::new(&self.binary);
        command.args(request.args()).current_dir(request.work_dir());
        let output = run_tool("rgfa-split", &mut command)?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!("rgfa-split: {}", stderr.trim());
        }
        Ok(())
    }
}

/// Find the partitioner's outputs in `dir`: files named `<prefix><label>.<ext>`
/// with an extension from [`ArtifactKind`]. Anything else is ignored.
///
/// # Errors
///
/// Returns an IO error if the directory can't be listed, or
/// `SplitError::InvalidName` for a label that can't be used as a path component.
pub fn collect_outputs(
    dir: &Path,
    prefix: &str,
) -> Result<BTreeMap<ChromLabel, LabelArtifacts<PathBuf>>, SplitError> {
    let mut outputs: BTreeMap<ChromLabel, LabelArtifacts<PathBuf>> = BTreeMap::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let (Some(stem), Some(ext)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|s| s.to_str()),
        ) else {
            continue;
        };
        let Some(kind) = ArtifactKind::from_extension(ext) else {
            continue;
        };
        let Some(label) = stem.strip_prefix(prefix).filter(|l| !l.is_empty()) else {
            continue;
        };
        validate_name(label).map_err(|source| SplitError::InvalidName {
            name: label.to_string(),
            source,
        })?;

        outputs
            .entry(ChromLabel::new(label))
            .or_default()
            .set(kind, path);
    }

    Ok(outputs)
}

/// Run the partitioner in a scratch directory and move its outputs into the store
///
/// # Errors
///
/// Returns the partitioner's error, or an IO/name error while collecting outputs.
pub fn run_partition(
    partitioner: &dyn ContigPartitioner,
    graph: &Path,
    alignment: &Path,
    mask_bed: Option<&Path>,
    config: &SplitConfig,
    selector: &ContigSelector,
    store: &FileStore,
) -> Result<PartitionMap, SplitError> {
    let scratch = store.scratch_dir("partition-")?;
    let out_prefix = scratch.path().join(OUTPUT_PREFIX);
    let request = PartitionRequest {
        graph,
        alignment,
        mask_bed,
        out_prefix: &out_prefix,
        config,
        selector,
    };
    partitioner.partition(&request)?;

    let mut partition = PartitionMap::new();
    for (label, files) in collect_outputs(scratch.path(), OUTPUT_PREFIX)? {
        let mut stored = LabelArtifacts::default();
        for kind in ArtifactKind::ALL {
            if let Some(path) = files.get(kind) {
                let name = format!("{label}.{}", kind.extension());
                stored.set(kind, store.write_file(path, &name)?);
            }
        }
        partition.insert(label, stored);
    }

    if partition.is_empty() {
        warn!("The partitioner produced no labels");
    }
    info!("Partitioned graph and alignment into {} labels", partition.len());
    Ok(partition)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().to_string()).collect()
    }

    #[test]
    fn test_extension_table() {
        for kind in ArtifactKind::ALL {
            assert_eq!(ArtifactKind::from_extension(kind.extension()), Some(kind));
        }
        assert_eq!(ArtifactKind::from_extension("fa"), None);
    }

    #[test]
    fn test_minimal_args() {
        let config = SplitConfig::default();
        let selector = ContigSelector::default();
        let request = PartitionRequest {
            graph: Path::new("/w/mg.gfa"),
            alignment: Path::new("/w/mg.paf"),
            mask_bed: None,
            out_prefix: Path::new("/w/split_"),
            config: &config,
            selector: &selector,
        };
        assert_eq!(
            strings(&request.args()),
            vec![
                "-i", "id=_MINIGRAPH_|", "-G", "-g", "/w/mg.gfa", "-p", "/w/mg.paf", "-b",
                "/w/split_", "-n", "0", "-N", "0", "-T", "0", "-Q", "0", "-a", "_AMBIGUOUS_",
            ]
        );
        assert_eq!(request.work_dir(), Path::new("/w"));
    }

    #[test]
    fn test_full_args() {
        let config = SplitConfig {
            min_query_coverage: 0.75,
            min_query_small_coverage: 0.5,
            min_query_small_threshold: 100_000,
            min_query_uniqueness: 3.0,
            ..SplitConfig::default()
        };
        let selector = ContigSelector::new(
            vec!["chr2".to_string(), "chr1".to_string()],
            Some("chrOther".to_string()),
            Some("CHM13".to_string()),
        )
        .unwrap();
        let request = PartitionRequest {
            graph: Path::new("g.gfa"),
            alignment: Path::new("a.paf"),
            mask_bed: Some(Path::new("mask.bed")),
            out_prefix: Path::new("split_"),
            config: &config,
            selector: &selector,
        };
        let args = strings(&request.args());
        let tail: Vec<&str> = args[9..].iter().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec![
                "-n", "0.75", "-N", "0.5", "-T", "100000", "-Q", "3", "-a", "_AMBIGUOUS_",
                "-o", "chrOther", "-r", "id=CHM13|", "-B", "mask.bed", "-c", "chr1", "-c",
                "chr2",
            ]
        );
    }

    #[test]
    fn test_collect_outputs() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "split_chr1.gfa",
            "split_chr1.paf",
            "split_chr1.fa_contigs",
            "split__AMBIGUOUS_.paf",
            "split__AMBIGUOUS_.fa_contigs",
            "split_chr1.log",
            "other.paf",
            "split_.paf",
        ] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let outputs = collect_outputs(dir.path(), OUTPUT_PREFIX).unwrap();
        assert_eq!(outputs.len(), 2);

        let chr1 = &outputs[&ChromLabel::new("chr1")];
        assert!(chr1.graph.is_some() && chr1.alignment.is_some() && chr1.contigs.is_some());
        let amb = &outputs[&ChromLabel::new("_AMBIGUOUS_")];
        assert!(amb.graph.is_none());
        assert!(amb.get(ArtifactKind::Alignment).is_some());
    }

    #[test]
    fn test_collect_dotted_label() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("split_chrUn.1.paf"), "").unwrap();
        let outputs = collect_outputs(dir.path(), OUTPUT_PREFIX).unwrap();
        assert!(outputs.contains_key(&ChromLabel::new("chrUn.1")));
    }

    struct Fake;

    impl ContigPartitioner for Fake {
        fn partition(&self, request: &PartitionRequest<'_>) -> Result<(), SplitError> {
            let prefix = request.out_prefix.display().to_string();
            std::fs::write(format!("{prefix}chrX.paf"), "aln\n")?;
            std::fs::write(format!("{prefix}chrX.fa_contigs"), "id=G|c1\n")?;
            Ok(())
        }
    }

    #[test]
    fn test_run_partition_stores_outputs() {
        let store = FileStore::new().unwrap();
        let partition = run_partition(
            &Fake,
            Path::new("g.gfa"),
            Path::new("a.paf"),
            None,
            &SplitConfig::default(),
            &ContigSelector::default(),
            &store,
        )
        .unwrap();

        let chrx = &partition[&ChromLabel::new("chrX")];
        assert!(chrx.graph.is_none());
        let paf = chrx.alignment.unwrap();
        assert_eq!(store.name(paf).unwrap(), "chrX.paf");
        assert_eq!(std::fs::read_to_string(store.path(paf).unwrap()).unwrap(), "aln\n");
    }
}
