use crate::core::types::QualifiedId;
use crate::parsing::ParseError;

/// A masked run of a genome's sequence: half-open, zero-based
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskInterval {
    pub id: QualifiedId,
    pub start: u64,
    pub end: u64,
}

impl MaskInterval {
    /// Number of masked bases
    #[must_use]
    pub fn span(&self) -> u64 {
        self.end - self.start
    }
}

impl std::fmt::Display for MaskInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\t{}\t{}", self.id, self.start, self.end)
    }
}

/// Parse mask BED text (`id=<genome>|<contig>\t<start>\t<end>`)
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a line has fewer than 3 fields, an
/// unqualified name, invalid coordinates, or `end < start`.
pub fn parse_bed_text(text: &str) -> Result<Vec<MaskInterval>, ParseError> {
    let mut intervals = Vec::new();

    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let line_num = i + 1;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has fewer than 3 fields"
            )));
        }

        let id = QualifiedId::parse(fields[0]).ok_or_else(|| {
            ParseError::InvalidFormat(format!(
                "Line {line_num}: '{}' is not a genome-qualified name",
                fields[0]
            ))
        })?;
        let coord = |s: &str| {
            s.trim().parse::<u64>().map_err(|_| {
                ParseError::InvalidFormat(format!("Invalid coordinate on line {line_num}: '{s}'"))
            })
        };
        let start = coord(fields[1])?;
        let end = coord(fields[2])?;
        if end < start {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num}: end {end} is before start {start}"
            )));
        }

        intervals.push(MaskInterval { id, start, end });
    }

    Ok(intervals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let interval = MaskInterval {
            id: QualifiedId::new("G1", "chr1"),
            start: 10,
            end: 20,
        };
        assert_eq!(interval.to_string(), "id=G1|chr1\t10\t20");
        assert_eq!(interval.span(), 10);
    }

    #[test]
    fn test_parse_bed_text() {
        let intervals = parse_bed_text("id=G1|chr1\t0\t5\nid=G2|ctg7\t3\t9\n").unwrap();
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[1].id, QualifiedId::new("G2", "ctg7"));
        assert_eq!(intervals[1].span(), 6);
    }

    #[test]
    fn test_parse_bed_errors() {
        assert!(parse_bed_text("chr1\t0\t5\n").is_err());
        assert!(parse_bed_text("id=G1|chr1\t0\n").is_err());
        assert!(parse_bed_text("id=G1|chr1\t9\t5\n").is_err());
        assert!(parse_bed_text("id=G1|chr1\tx\t5\n").is_err());
    }
}
