//! Sequence manifests ("seqfiles").
//!
//! ```text
//! # optional comments
//! ((HG002,HG003),_MINIGRAPH_);
//! HG002        s3data/HG002.fa.gz
//! HG003        /data/HG003/
//! _MINIGRAPH_  https://example.org/graph.fa
//! ```
//!
//! The first non-comment line may be a Newick tree; every other line maps a genome
//! name to a FASTA path, a directory of FASTA pieces, or a URL. A leading `*` on a
//! name is accepted and stripped.

use std::collections::HashSet;
use std::path::Path;

use crate::parsing::newick::leaf_names;
use crate::parsing::ParseError;

/// One `name path` row of a seqfile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqFileEntry {
    pub name: String,
    pub locator: String,
}

/// A parsed sequence manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeqFile {
    /// Newick tree, if one was given
    pub tree: Option<String>,

    /// Genome rows in file order
    pub entries: Vec<SeqFileEntry>,
}

impl SeqFile {
    /// Leaf genome names: the tree's leaves, or every listed genome when there is no tree
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidFormat` if the tree cannot be parsed.
    pub fn leaves(&self) -> Result<Vec<String>, ParseError> {
        match &self.tree {
            Some(tree) => leaf_names(tree),
            None => Ok(self.entries.iter().map(|e| e.name.clone()).collect()),
        }
    }

    /// Look up the locator of a genome
    #[must_use]
    pub fn locator(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.locator.as_str())
    }
}

/// Parse a seqfile from disk
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_seqfile(path: &Path) -> Result<SeqFile, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_seqfile_text(&content)
}

/// Parse seqfile text
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a row lacks a path, a genome is listed
/// twice, a tree appears after genome rows, or no genomes are listed.
pub fn parse_seqfile_text(text: &str) -> Result<SeqFile, ParseError> {
    let mut seqfile = SeqFile::default();
    let mut seen = HashSet::new();

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;

        if line.starts_with('(') {
            if seqfile.tree.is_some() || !seqfile.entries.is_empty() {
                return Err(ParseError::InvalidFormat(format!(
                    "Line {line_num}: tree must be the first entry of the seqfile"
                )));
            }
            seqfile.tree = Some(line.to_string());
            continue;
        }

        let mut fields = line.split_whitespace();
        let name = fields.next().unwrap_or_default();
        let name = name.strip_prefix('*').unwrap_or(name).to_string();
        let locator = fields.next().ok_or_else(|| {
            ParseError::InvalidFormat(format!("Line {line_num}: no path given for '{name}'"))
        })?;

        if !seen.insert(name.clone()) {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num}: genome '{name}' listed more than once"
            )));
        }

        seqfile.entries.push(SeqFileEntry {
            name,
            locator: locator.to_string(),
        });
    }

    if seqfile.entries.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No genomes found in seqfile".to_string(),
        ));
    }

    Ok(seqfile)
}
