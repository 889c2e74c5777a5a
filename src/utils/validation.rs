//! Centralized validation of names that end up as path components.
//!
//! Genome names and chromosome labels are used verbatim to build output paths
//! (`<label>/fasta/<genome>_<label>.fa`), so they must not be able to escape the
//! output directory or confuse downstream tab-separated manifests.

/// Maximum length of a genome name or label
pub const MAX_NAME_LENGTH: usize = 255;

/// Name validation error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Name too long: exceeds {MAX_NAME_LENGTH} characters")]
    NameTooLong,
    #[error("Empty name provided")]
    EmptyName,
    #[error("Name contains path traversal or separator characters")]
    PathTraversal,
    #[error("Name contains whitespace or control characters")]
    InvalidCharacters,
}

/// Validate a genome name or chromosome label for use as a path component.
///
/// # Examples
///
/// ```
/// use chrom_split::utils::validation::validate_name;
///
/// assert!(validate_name("chr1").is_ok());
/// assert!(validate_name("_AMBIGUOUS_").is_ok());
/// assert!(validate_name("../etc").is_err());
/// ```
///
/// # Errors
///
/// Returns `ValidationError::EmptyName` if the name is empty,
/// `ValidationError::NameTooLong` if it exceeds the limit,
/// `ValidationError::PathTraversal` if it contains separators or is `.`/`..`, or
/// `ValidationError::InvalidCharacters` if it contains whitespace or control characters.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }

    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(ValidationError::PathTraversal);
    }

    // Tabs and newlines would break the manifests
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidCharacters);
    }

    Ok(())
}
