use crate::model::DocId;
use std::path::PathBuf;
use thiserror::Error;

/// The coarse failure taxonomy callers map onto their own transport statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Validation,
    CorruptData,
    Conflict,
    Io,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::CorruptData => "corrupt_data",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document {id} not found in collection '{collection}'")]
    NotFound { collection: String, id: DocId },

    #[error("Backup archive not found: {0}")]
    ArchiveNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Corrupt data in {}: {message}", path.display())]
    CorruptData { path: PathBuf, message: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } | StoreError::ArchiveNotFound(_) => ErrorKind::NotFound,
            StoreError::Validation(_) => ErrorKind::Validation,
            StoreError::CorruptData { .. } => ErrorKind::CorruptData,
            StoreError::Conflict(_) => ErrorKind::Conflict,
            StoreError::Io(_) | StoreError::Encode(_) | StoreError::Config(_) => ErrorKind::Io,
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.kind().as_str()
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strings_are_stable() {
        assert_eq!(ErrorKind::NotFound.as_str(), "not_found");
        assert_eq!(ErrorKind::CorruptData.as_str(), "corrupt_data");
        assert_eq!(ErrorKind::Conflict.as_str(), "conflict");
    }

    #[test]
    fn variants_map_onto_taxonomy() {
        let err = StoreError::NotFound {
            collection: "rebels-ranking".into(),
            id: DocId::Int(7),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Document 7 not found in collection 'rebels-ranking'");

        let err = StoreError::ArchiveNotFound("backup-x".into());
        assert_eq!(err.code_str(), "not_found");

        let err = StoreError::Config("bad toml".into());
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn corrupt_data_names_the_file() {
        let err = StoreError::CorruptData {
            path: PathBuf::from("data/notifications.json"),
            message: "expected a JSON array".into(),
        };
        assert!(err.to_string().contains("data/notifications.json"));
        assert_eq!(err.kind(), ErrorKind::CorruptData);
    }
}
