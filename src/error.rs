//! bundlepin error types and classification helpers
use crate::operator::related::RelatedImageConflict;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = ManifestError> = std::result::Result<T, E>;

/// Main error type for manifest operations
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Document `kind` is missing or is not `ClusterServiceVersion`
    #[error("Not a ClusterServiceVersion")]
    NotOperatorCsv,

    /// A `RELATED_IMAGE_*` env var resolves its value indirectly
    #[error("{name}: \"valueFrom\" references are not supported")]
    UnsupportedReference { name: String },

    /// Same relatedImage name maps to different images
    #[error(
        "{path} - Found conflicts when setting relatedImages:\n{}",
        format_conflicts(.conflicts)
    )]
    RelatedImagesConflict {
        path: String,
        conflicts: Vec<RelatedImageConflict>,
    },

    #[error("Path does not exist or is not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },

    /// String cannot be decomposed into an image reference
    #[error("Invalid image reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    /// Write target inside the document does not exist
    #[error("Path not found in document: {path}")]
    PathNotFound { path: String },

    #[error("Invalid value '{value}' for {key}")]
    InvalidConfig { key: String, value: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn format_conflicts(conflicts: &[RelatedImageConflict]) -> String {
    conflicts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Helper to determine if a directory scan should skip a file instead of failing.
///
/// Bundles routinely mix CSVs with CRDs, plain text and binary files, so anything
/// that is not a loadable ClusterServiceVersion is simply not part of the manifest.
pub fn is_skippable(err: &ManifestError) -> bool {
    match err {
        ManifestError::NotOperatorCsv => true,
        ManifestError::Yaml(_) => true,
        ManifestError::Io { source, .. } => source.kind() == std::io::ErrorKind::InvalidData,
        ManifestError::UnsupportedReference { .. } => false,
        ManifestError::RelatedImagesConflict { .. } => false,
        ManifestError::NotADirectory { .. } => false,
        ManifestError::InvalidReference { .. } => false,
        ManifestError::PathNotFound { .. } => false,
        ManifestError::InvalidConfig { .. } => false,
        ManifestError::Walk(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_csv_display() {
        assert_eq!(
            ManifestError::NotOperatorCsv.to_string(),
            "Not a ClusterServiceVersion"
        );
    }

    #[test]
    fn test_skippable_detection() {
        assert!(is_skippable(&ManifestError::NotOperatorCsv));

        let bad_utf8 = ManifestError::Io {
            path: PathBuf::from("blob.bin"),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, "not utf-8"),
        };
        assert!(is_skippable(&bad_utf8));

        let denied = ManifestError::Io {
            path: PathBuf::from("csv.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!is_skippable(&denied));

        let value_from = ManifestError::UnsupportedReference {
            name: "RELATED_IMAGE_FOO".to_string(),
        };
        assert!(!is_skippable(&value_from));
    }

    #[test]
    fn test_not_a_directory_display() {
        let err = ManifestError::NotADirectory {
            path: PathBuf::from("/nonexistent"),
        };
        assert_eq!(
            err.to_string(),
            "Path does not exist or is not a directory: /nonexistent"
        );
    }
}
