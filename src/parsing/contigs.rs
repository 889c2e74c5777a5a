use std::path::Path;

use crate::parsing::ParseError;

/// Read a newline-separated contig list, taking the first whitespace-delimited
/// token of every non-blank line
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read.
pub fn parse_contig_list_file(path: &Path) -> Result<Vec<String>, ParseError> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_contig_list_text(&content))
}

#[must_use]
pub fn parse_contig_list_text(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}
