use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::SplitError;
use crate::core::types::{ChromLabel, LabelKind};

/// Default name of the virtual genome that produced the graph
pub const DEFAULT_GRAPH_EVENT: &str = "_MINIGRAPH_";

/// Default label for content the partitioner cannot place
pub const DEFAULT_AMBIGUOUS_NAME: &str = "_AMBIGUOUS_";

/// Every tunable of a split run, resolved once before any work starts.
///
/// Loaded from an optional JSON file; fields missing from the file take their defaults,
/// and command-line flags are layered on top by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Minimum length of soft-masked runs reported to the partitioner (unset or 0 disables)
    pub mask_filter: Option<u64>,

    /// Minimum fraction of a query contig aligned to its chosen reference contig
    pub min_query_coverage: f64,

    /// Coverage requirement applied to contigs shorter than `min_query_small_threshold`
    pub min_query_small_coverage: f64,

    /// Length below which a query contig counts as small
    pub min_query_small_threshold: u64,

    /// Minimum ratio between the best and second-best reference contig coverage
    pub min_query_uniqueness: f64,

    /// Name of the genome whose sequences make up the graph
    pub graph_event: String,

    /// Label the partitioner assigns to unplaceable content
    pub ambiguous_name: String,

    /// Contig partitioning binary
    pub partition_tool: PathBuf,

    /// samtools binary used for region extraction
    pub samtools: PathBuf,

    /// Maximum number of tasks running at once
    pub max_jobs: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            mask_filter: None,
            min_query_coverage: 0.0,
            min_query_small_coverage: 0.0,
            min_query_small_threshold: 0,
            min_query_uniqueness: 0.0,
            graph_event: DEFAULT_GRAPH_EVENT.to_string(),
            ambiguous_name: DEFAULT_AMBIGUOUS_NAME.to_string(),
            partition_tool: PathBuf::from("rgfa-split"),
            samtools: PathBuf::from("samtools"),
            max_jobs: std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get),
        }
    }
}

impl SplitConfig {
    /// Load configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `SplitError::Io` if the file cannot be read or
    /// `SplitError::Configuration` if it is not valid configuration JSON.
    pub fn load_from_file(path: &Path) -> Result<Self, SplitError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string
    ///
    /// # Errors
    ///
    /// Returns `SplitError::Configuration` if the JSON does not describe a configuration.
    pub fn from_json(json: &str) -> Result<Self, SplitError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SplitError::configuration(format!("invalid config file: {e}")))?;
        if config.max_jobs == 0 {
            return Err(SplitError::configuration("max_jobs must be at least 1"));
        }
        Ok(config)
    }

    /// The masking threshold, if masking is enabled
    #[must_use]
    pub fn mask_threshold(&self) -> Option<u64> {
        self.mask_filter.filter(|&n| n > 0)
    }

    /// Classify a label produced by the partitioner
    #[must_use]
    pub fn label_kind(&self, selector: &ContigSelector, label: &ChromLabel) -> LabelKind {
        if label.as_str() == self.ambiguous_name {
            LabelKind::Ambiguous
        } else if selector.other.as_deref() == Some(label.as_str()) {
            LabelKind::Other
        } else {
            LabelKind::Contig
        }
    }
}

/// Which reference contigs stay distinct in the output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContigSelector {
    /// Reference contigs that get their own label
    pub contigs: BTreeSet<String>,

    /// Label absorbing every other reference contig
    pub other: Option<String>,

    /// Genome exempt from ambiguity filtering
    pub reference: Option<String>,
}

impl ContigSelector {
    /// Build a selector, rejecting a catch-all label that names a selected contig
    ///
    /// # Errors
    ///
    /// Returns `SplitError::Configuration` if `other` is also one of `contigs`.
    pub fn new(
        contigs: impl IntoIterator<Item = String>,
        other: Option<String>,
        reference: Option<String>,
    ) -> Result<Self, SplitError> {
        let contigs: BTreeSet<String> = contigs.into_iter().collect();
        if let Some(other) = &other {
            if contigs.contains(other) {
                return Err(SplitError::configuration(format!(
                    "catch-all contig name '{other}' is also a selected reference contig"
                )));
            }
        }
        Ok(Self {
            contigs,
            other,
            reference,
        })
    }
}
