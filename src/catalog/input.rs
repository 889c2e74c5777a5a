use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::config::SplitConfig;
use crate::core::error::SplitError;
use crate::parsing::seqfile::SeqFile;
use crate::pipeline::store::{FileId, FileStore};
use crate::utils::location::{is_gzipped_name, Location};
use crate::utils::validation::validate_name;

/// A leaf genome taking part in the split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genome {
    /// Genome name, unique within the catalog
    pub name: String,

    /// Where the sequence came from, as given in the seqfile
    pub source: Location,

    /// The genome's sequence in the file store
    pub file: FileId,

    /// Whether the sequence is gzip-compressed
    pub gzipped: bool,

    /// Size of the stored sequence in bytes (scheduling hint only)
    pub size: u64,
}

/// The genomes of a split run, in seqfile order
#[derive(Debug, Clone, Default)]
pub struct InputCatalog {
    genomes: Vec<Genome>,
}

impl InputCatalog {
    /// Build the catalog from a seqfile, importing every leaf genome's sequence
    /// into `store`.
    ///
    /// # Errors
    ///
    /// Returns `SplitError::Configuration` if the graph genome or `reference` is not
    /// a leaf, `SplitError::InvalidName` for a genome name unusable in paths, or an
    /// IO/remote error if a sequence cannot be imported.
    pub fn build(
        seqfile: &SeqFile,
        config: &SplitConfig,
        reference: Option<&str>,
        store: &FileStore,
    ) -> Result<Self, SplitError> {
        let leaves = seqfile.leaves()?;
        let leaf_set: HashSet<&str> = leaves.iter().map(String::as_str).collect();

        if !leaf_set.contains(config.graph_event.as_str()) {
            return Err(SplitError::configuration(format!(
                "graph genome '{}' not found in seqfile",
                config.graph_event
            )));
        }
        if let Some(reference) = reference {
            if !leaf_set.contains(reference) {
                return Err(SplitError::configuration(format!(
                    "reference genome '{reference}' not found in seqfile"
                )));
            }
        }

        let mut genomes = Vec::new();
        for entry in &seqfile.entries {
            if !leaf_set.contains(entry.name.as_str()) {
                debug!("Skipping '{}': not a leaf of the tree", entry.name);
                continue;
            }
            validate_name(&entry.name).map_err(|source| SplitError::InvalidName {
                name: entry.name.clone(),
                source,
            })?;

            let source = Location::parse(&entry.locator)?;
            let (file, gzipped) = match source.as_local() {
                Some(dir) if dir.is_dir() => concat_directory(&entry.name, dir, store)?,
                _ => {
                    info!("Importing {source}");
                    (store.import(&source)?, source.is_gzipped())
                }
            };
            let size = store.size(file)?;

            genomes.push(Genome {
                name: entry.name.clone(),
                source,
                file,
                gzipped,
                size,
            });
        }

        for leaf in &leaves {
            if seqfile.locator(leaf).is_none() {
                warn!("Leaf '{leaf}' has no sequence in the seqfile and will be ignored");
            }
        }

        Ok(Self { genomes })
    }

    #[must_use]
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Genome> {
        self.genomes.iter().find(|g| g.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }
}

/// Concatenate the files of a directory (sorted by name) into one stored sequence
fn concat_directory(
    genome: &str,
    dir: &Path,
    store: &FileStore,
) -> Result<(FileId, bool), SplitError> {
    let mut pieces: Vec<PathBuf> = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|p| p.is_file())
        .collect();
    pieces.sort();

    if pieces.is_empty() {
        return Err(SplitError::configuration(format!(
            "sequence directory for '{genome}' is empty: {}",
            dir.display()
        )));
    }

    let gzipped = pieces
        .iter()
        .filter(|p| is_gzipped_name(&p.to_string_lossy()))
        .count();
    if gzipped != 0 && gzipped != pieces.len() {
        return Err(SplitError::configuration(format!(
            "sequence directory for '{genome}' mixes compressed and uncompressed files: {}",
            dir.display()
        )));
    }
    let gzipped = gzipped != 0;

    info!(
        "Concatenating {} files from {} for '{genome}'",
        pieces.len(),
        dir.display()
    );
    let name = if gzipped {
        format!("{genome}.fa.gz")
    } else {
        format!("{genome}.fa")
    };
    let scratch = store.scratch_dir("concat-")?;
    let path = scratch.path().join(&name);
    let mut out = File::create(&path)?;
    for piece in &pieces {
        // Concatenated gzip members form a valid multi-member stream
        std::io::copy(&mut File::open(piece)?, &mut out)?;
    }
    drop(out);

    Ok((store.write_file(&path, &name)?, gzipped))
}
