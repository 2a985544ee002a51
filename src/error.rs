// ⚠️ Error types for ingestion and cost calculation
//
// Missing files and malformed values are fatal; missing *optional* data
// (blank fields, absent attributes) never reaches this enum.

use crate::parser::SourceKind;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience result type for the core library.
pub type ZooResult<T> = Result<T, ZooError>;

#[derive(Debug, Error)]
pub enum ZooError {
    /// The source file does not exist.
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Any other I/O failure while reading a source file.
    #[error("io error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A field is present but its text is not a valid decimal.
    #[error("failed to parse {field} in {} line {line}: {message} (raw='{raw}')", source_kind.name())]
    Parse {
        source_kind: SourceKind,
        line: usize,
        field: String,
        raw: String,
        message: String,
    },

    /// The inventory document is not well-formed markup.
    #[error("malformed inventory markup in {}: {message}", path.display())]
    Xml { path: PathBuf, message: String },

    /// Cost lookup for an animal id that is not in the snapshot.
    #[error("animal with id {id} not found")]
    AnimalNotFound { id: i64 },

    /// A cost figure does not fit in a `Decimal`.
    #[error("cost for animal '{animal}' overflows while computing {step}")]
    CostOverflow { animal: String, step: &'static str },
}

impl ZooError {
    /// Map an `io::Error` on `path` to `NotFound` when that is what it is.
    pub fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            ZooError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ZooError::Io {
                path: path.to_path_buf(),
                source: err,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ZooError::NotFound { .. } | ZooError::AnimalNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;

    #[test]
    fn test_from_io_maps_not_found() {
        let err = ZooError::from_io(
            Path::new("missing.csv"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ZooError::NotFound { .. }));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "file not found: missing.csv");
    }

    #[test]
    fn test_from_io_keeps_other_kinds() {
        let err = ZooError::from_io(
            Path::new("locked.csv"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ZooError::Io { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_parse_error_message() {
        let err = ZooError::Parse {
            source_kind: SourceKind::Taxonomy,
            line: 4,
            field: "food_to_weight_ratio".to_string(),
            raw: "ten".to_string(),
            message: "Invalid decimal".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("line 4"));
        assert!(text.contains("raw='ten'"));
    }

    #[test]
    fn test_cost_overflow_message() {
        let err = ZooError::CostOverflow {
            animal: "Jumbo".to_string(),
            step: "daily food amount",
        };
        assert_eq!(
            err.to_string(),
            "cost for animal 'Jumbo' overflows while computing daily food amount"
        );
        assert!(!err.is_not_found());
    }
}
