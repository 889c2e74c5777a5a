use serde::{Deserialize, Serialize};

/// Prefix shared by every genome-qualified identifier
pub const ID_PREFIX: &str = "id=";

/// Separator between the genome name and the bare sequence name
pub const ID_SEPARATOR: char = '|';

/// A sequence identifier tagged with the genome it belongs to.
///
/// Rendered as `id=<genome>|<contig>`, which is the form the partition tool reads
/// from interval files and writes into its per-label contig lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedId {
    pub genome: String,
    pub contig: String,
}

impl QualifiedId {
    pub fn new(genome: impl Into<String>, contig: impl Into<String>) -> Self {
        Self {
            genome: genome.into(),
            contig: contig.into(),
        }
    }

    /// The prefix every identifier of `genome` starts with (`id=<genome>|`)
    #[must_use]
    pub fn genome_prefix(genome: &str) -> String {
        format!("{ID_PREFIX}{genome}{ID_SEPARATOR}")
    }

    /// Parse `id=<genome>|<contig>`. The genome is everything up to the first separator.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix(ID_PREFIX)?;
        let (genome, contig) = rest.split_once(ID_SEPARATOR)?;
        if genome.is_empty() || contig.is_empty() {
            return None;
        }
        Some(Self::new(genome, contig))
    }

    /// Return the bare contig name if `s` is qualified with `genome`
    #[must_use]
    pub fn strip_genome<'a>(s: &'a str, genome: &str) -> Option<&'a str> {
        s.strip_prefix(ID_PREFIX)?
            .strip_prefix(genome)?
            .strip_prefix(ID_SEPARATOR)
            .filter(|contig| !contig.is_empty())
    }
}

impl std::fmt::Display for QualifiedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{ID_PREFIX}{}{ID_SEPARATOR}{}", self.genome, self.contig)
    }
}

/// The partition key produced by the contig partitioner
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChromLabel(pub String);

impl ChromLabel {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChromLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a label stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    /// A reference contig kept distinct
    Contig,
    /// The catch-all label for unselected reference contigs
    Other,
    /// Content that could not be assigned to a single reference contig
    Ambiguous,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_id_format_and_parse() {
        let id = QualifiedId::new("CHM13", "chr1");
        assert_eq!(id.to_string(), "id=CHM13|chr1");
        assert_eq!(QualifiedId::parse("id=CHM13|chr1"), Some(id));
    }

    #[test]
    fn test_qualified_id_contig_keeps_separators() {
        let id = QualifiedId::parse("id=HG002.1|JAHKSE010000012.1|extra").unwrap();
        assert_eq!(id.genome, "HG002.1");
        assert_eq!(id.contig, "JAHKSE010000012.1|extra");
    }

    #[test]
    fn test_qualified_id_rejects_malformed() {
        assert!(QualifiedId::parse("CHM13|chr1").is_none());
        assert!(QualifiedId::parse("id=CHM13").is_none());
        assert!(QualifiedId::parse("id=|chr1").is_none());
        assert!(QualifiedId::parse("id=CHM13|").is_none());
    }

    #[test]
    fn test_strip_genome() {
        assert_eq!(QualifiedId::strip_genome("id=G1|chr1", "G1"), Some("chr1"));
        assert_eq!(QualifiedId::strip_genome("id=G10|chr1", "G1"), None);
        assert_eq!(QualifiedId::strip_genome("id=G2|chr1", "G1"), None);
        assert_eq!(QualifiedId::strip_genome("chr1", "G1"), None);
    }

    #[test]
    fn test_genome_prefix() {
        assert_eq!(QualifiedId::genome_prefix("_MINIGRAPH_"), "id=_MINIGRAPH_|");
    }
}
