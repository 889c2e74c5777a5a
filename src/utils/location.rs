//! Local paths and remote URLs for inputs and output roots.

use std::path::{Path, PathBuf};

use crate::core::error::SplitError;

/// A place a file is read from or written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Local(PathBuf),
    /// An `http://` or `https://` URL
    Remote(String),
}

impl Location {
    /// Parse a user-supplied path or URL.
    ///
    /// Plain paths and `file://` URLs are local; `http(s)://` URLs are remote.
    ///
    /// # Errors
    ///
    /// Returns `SplitError::Configuration` for any other URL scheme.
    pub fn parse(s: &str) -> Result<Self, SplitError> {
        match s.split_once("://") {
            None => Ok(Self::Local(PathBuf::from(s))),
            Some(("file", path)) => Ok(Self::Local(PathBuf::from(path))),
            Some((scheme, _)) if scheme.eq_ignore_ascii_case("http") => {
                Ok(Self::Remote(s.to_string()))
            }
            Some((scheme, _)) if scheme.eq_ignore_ascii_case("https") => {
                Ok(Self::Remote(s.to_string()))
            }
            Some((scheme, _)) => Err(SplitError::configuration(format!(
                "unsupported URL scheme '{scheme}' in {s}"
            ))),
        }
    }

    /// Append one path component
    #[must_use]
    pub fn join(&self, part: &str) -> Self {
        match self {
            Self::Local(path) => Self::Local(path.join(part)),
            Self::Remote(url) => Self::Remote(format!("{}/{part}", url.trim_end_matches('/'))),
        }
    }

    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Final path component
    #[must_use]
    pub fn file_name(&self) -> Option<String> {
        match self {
            Self::Local(path) => path.file_name().map(|n| n.to_string_lossy().to_string()),
            Self::Remote(url) => url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|n| !n.is_empty() && !n.contains("://"))
                .map(str::to_string),
        }
    }

    /// Whether the name carries a gzip suffix
    #[must_use]
    pub fn is_gzipped(&self) -> bool {
        self.file_name().is_some_and(|name| is_gzipped_name(&name))
    }

    #[must_use]
    pub fn as_local(&self) -> Option<&Path> {
        match self {
            Self::Local(path) => Some(path),
            Self::Remote(_) => None,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// Check if a file name carries a gzip/bgzip suffix
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
#[must_use]
pub fn is_gzipped_name(name: &str) -> bool {
    let name = name.to_lowercase();
    name.ends_with(".gz") || name.ends_with(".bgz")
}

/// Strip a gzip/bgzip suffix, if any
#[must_use]
pub fn strip_gz_suffix(name: &str) -> &str {
    if is_gzipped_name(name) {
        name.rsplit_once('.').map_or(name, |(stem, _)| stem)
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locations() {
        assert_eq!(
            Location::parse("/data/hg38.fa").unwrap(),
            Location::Local(PathBuf::from("/data/hg38.fa"))
        );
        assert_eq!(
            Location::parse("file:///data/hg38.fa").unwrap(),
            Location::Local(PathBuf::from("/data/hg38.fa"))
        );
        assert!(Location::parse("https://example.org/hg38.fa.gz")
            .unwrap()
            .is_remote());
        assert!(matches!(
            Location::parse("s3://bucket/hg38.fa"),
            Err(SplitError::Configuration(_))
        ));
    }

    #[test]
    fn test_join_remote() {
        let root = Location::parse("https://example.org/out/").unwrap();
        let joined = root.join("seqfiles").join("chr1.seqfile");
        assert_eq!(
            joined.to_string(),
            "https://example.org/out/seqfiles/chr1.seqfile"
        );
        assert_eq!(joined.file_name().as_deref(), Some("chr1.seqfile"));
    }

    #[test]
    fn test_gzip_detection() {
        assert!(Location::parse("x/hg38.fa.gz").unwrap().is_gzipped());
        assert!(Location::parse("https://h/hg38.FA.BGZ").unwrap().is_gzipped());
        assert!(!Location::parse("x/hg38.fa").unwrap().is_gzipped());
        assert_eq!(strip_gz_suffix("hg38.fa.gz"), "hg38.fa");
        assert_eq!(strip_gz_suffix("hg38.fa"), "hg38.fa");
    }
}
