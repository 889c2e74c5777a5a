//! Materialize a gathered table as per-chromosome directories plus manifests.
//!
//! ```text
//! <root>/<label>/<label>.gfa                      (absent for the ambiguous label)
//! <root>/<label>/<label>.paf
//! <root>/<label>/fasta/<genome>_<label>.fa[.gz]
//! <root>/seqfiles/<label>.seqfile                 (non-empty slices only)
//! <root>/chromfile.txt                            (every label but the ambiguous one)
//! ```
//!
//! The root may be a local directory or an `http(s)://` URL that accepts PUT.
//! Nothing is rolled back if the export fails part way.

use std::fs::File;
use std::path::Path;

use tracing::{debug, info};

use crate::catalog::InputCatalog;
use crate::core::config::{ContigSelector, SplitConfig};
use crate::core::error::SplitError;
use crate::core::types::{ChromLabel, LabelKind};
use crate::pipeline::store::FileStore;
use crate::split::gather::{GatheredTable, LabelEntry};
use crate::split::slice::slice_file_name;
use crate::utils::location::Location;

/// Name of the top-level manifest
pub const CHROMFILE_NAME: &str = "chromfile.txt";

/// Directory holding the per-label seqfiles
pub const SEQFILE_DIR: &str = "seqfiles";

/// What an export wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub labels: usize,
    pub files: usize,
    pub chromfile: Location,
}

/// Writes files under an output root
struct Destination {
    client: Option<reqwest::blocking::Client>,
    written: usize,
}

impl Destination {
    fn new(root: &Location) -> Self {
        Self {
            client: root.is_remote().then(reqwest::blocking::Client::new),
            written: 0,
        }
    }

    fn put_file(&mut self, source: &Path, dest: &Location) -> Result<(), SplitError> {
        match (dest, &self.client) {
            (Location::Local(path), _) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::copy(source, path)?;
            }
            (Location::Remote(url), Some(client)) => {
                client
                    .put(url)
                    .body(File::open(source)?)
                    .send()?
                    .error_for_status()?;
            }
            (Location::Remote(url), None) => {
                return Err(SplitError::configuration(format!(
                    "remote destination {url} under a local output root"
                )));
            }
        }
        debug!("Wrote {dest}");
        self.written += 1;
        Ok(())
    }

    fn put_text(&mut self, text: String, dest: &Location) -> Result<(), SplitError> {
        match (dest, &self.client) {
            (Location::Local(path), _) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, text)?;
            }
            (Location::Remote(url), Some(client)) => {
                client.put(url).body(text).send()?.error_for_status()?;
            }
            (Location::Remote(url), None) => {
                return Err(SplitError::configuration(format!(
                    "remote destination {url} under a local output root"
                )));
            }
        }
        debug!("Wrote {dest}");
        self.written += 1;
        Ok(())
    }
}

/// One `chromfile.txt` row. Under a remote root the seqfile column is relative
/// to the root, since downstream alignment reads seqfiles locally.
#[must_use]
pub fn chromfile_row(
    root: &Location,
    label: &ChromLabel,
    seqfile: &Location,
    paf: &Location,
) -> String {
    if root.is_remote() {
        format!("{label}\t{SEQFILE_DIR}/{label}.seqfile\t{paf}\n")
    } else {
        format!("{label}\t{seqfile}\t{paf}\n")
    }
}

/// Write every label of `table` under `root`, then the top-level chromfile
///
/// # Errors
///
/// Returns `SplitError::Consistency` if the table names a genome the catalog
/// doesn't know, or an IO/remote error if a write fails.
pub fn export(
    table: &GatheredTable,
    catalog: &InputCatalog,
    config: &SplitConfig,
    selector: &ContigSelector,
    store: &FileStore,
    root: &Location,
) -> Result<ExportSummary, SplitError> {
    info!("Exporting {} labels to {root}", table.len());
    let mut dest = Destination::new(root);
    let mut chromfile = String::new();

    for (label, entry) in table {
        let (seqfile, paf) = export_label(&mut dest, label, entry, catalog, store, root)?;

        if config.label_kind(selector, label) == LabelKind::Ambiguous {
            continue;
        }
        chromfile.push_str(&chromfile_row(root, label, &seqfile, &paf));
    }

    let chromfile_location = root.join(CHROMFILE_NAME);
    dest.put_text(chromfile, &chromfile_location)?;
    info!("Wrote {chromfile_location}");

    Ok(ExportSummary {
        labels: table.len(),
        files: dest.written,
        chromfile: chromfile_location,
    })
}

/// Write one label's directory and seqfile. Returns the seqfile and alignment locations.
fn export_label(
    dest: &mut Destination,
    label: &ChromLabel,
    entry: &LabelEntry,
    catalog: &InputCatalog,
    store: &FileStore,
    root: &Location,
) -> Result<(Location, Location), SplitError> {
    let dir = root.join(label.as_str());

    if let Some(graph) = entry.graph {
        dest.put_file(&store.path(graph)?, &dir.join(&format!("{label}.gfa")))?;
    }
    let paf = dir.join(&format!("{label}.paf"));
    dest.put_file(&store.path(entry.alignment)?, &paf)?;

    let fasta_dir = dir.join("fasta");
    let mut rows = String::new();
    let mut empty = 0;
    for (genome, slice) in &entry.fasta {
        let gzipped = catalog
            .get(genome)
            .ok_or_else(|| {
                SplitError::consistency(format!(
                    "label '{label}' has a slice for unknown genome '{genome}'"
                ))
            })?
            .gzipped;
        let fasta = fasta_dir.join(&slice_file_name(genome, label, gzipped));
        dest.put_file(&store.path(*slice)?, &fasta)?;

        // Empty slices stay on disk but are left out of the seqfile
        if store.size(*slice)? > 0 {
            rows.push_str(&format!("{genome}\t{fasta}\n"));
        } else {
            empty += 1;
        }
    }

    let seqfile = root.join(SEQFILE_DIR).join(&format!("{label}.seqfile"));
    dest.put_text(rows, &seqfile)?;
    info!(
        "Exported {label}: {} genomes ({empty} empty)",
        entry.fasta.len()
    );

    Ok((seqfile, paf))
}
