//! Join the partition with every genome's slices into one table keyed by label.

use std::collections::BTreeMap;

use crate::core::error::SplitError;
use crate::core::types::ChromLabel;
use crate::pipeline::store::FileId;
use crate::split::partition::PartitionMap;
use crate::split::slice::SliceMap;

/// Everything exported for one label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEntry {
    /// Absent for the ambiguous label
    pub graph: Option<FileId>,
    pub alignment: FileId,
    /// Genome name to that genome's slice (possibly empty)
    pub fasta: BTreeMap<String, FileId>,
}

pub type GatheredTable = BTreeMap<ChromLabel, LabelEntry>;

/// Join `partition` with the per-genome slice maps
///
/// # Errors
///
/// Returns `SplitError::Consistency` if a label has no alignment, or if a
/// genome's slice map is missing a label or has one the partition doesn't.
pub fn gather(
    partition: &PartitionMap,
    slices: &BTreeMap<String, SliceMap>,
) -> Result<GatheredTable, SplitError> {
    for (genome, map) in slices {
        if let Some(extra) = map.keys().find(|label| !partition.contains_key(*label)) {
            return Err(SplitError::consistency(format!(
                "genome '{genome}' has a slice for unknown label '{extra}'"
            )));
        }
    }

    let mut table = GatheredTable::new();
    for (label, artifacts) in partition {
        let alignment = artifacts.alignment.ok_or_else(|| {
            SplitError::consistency(format!("label '{label}' has no alignment"))
        })?;

        let mut fasta = BTreeMap::new();
        for (genome, map) in slices {
            let slice = map.get(label).ok_or_else(|| {
                SplitError::consistency(format!(
                    "genome '{genome}' has no slice for label '{label}'"
                ))
            })?;
            fasta.insert(genome.clone(), *slice);
        }

        table.insert(
            label.clone(),
            LabelEntry {
                graph: artifacts.graph,
                alignment,
                fasta,
            },
        );
    }
    Ok(table)
}
