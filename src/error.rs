// ⚠️ Error Model - typed failures for readers, builder, merges and store
// Every failure the library can surface maps to one variant.

use std::path::PathBuf;

use thiserror::Error;

use crate::detect::FileKind;
use crate::taxon::Rank;

pub type Result<T> = std::result::Result<T, TaxonomyError>;

#[derive(Debug, Error)]
pub enum TaxonomyError {
    /// The file is not the expected kind or shape (not a spreadsheet, missing
    /// header markers, unparseable version, unknown row level).
    #[error("{source_name}: {reason}")]
    Format { source_name: String, reason: String },

    /// A row introduces a rank whose parent was never established.
    #[error("row {row}: {rank} row found before any {missing} row")]
    StructuralOrder { row: usize, rank: Rank, missing: Rank },

    #[error("multiple files of kind {kind} in one batch")]
    DuplicateKind { kind: FileKind },

    #[error("version mismatch between files: {}", versions.join(", "))]
    VersionMismatch { versions: Vec<String> },

    #[error("directory '{}' already exists", .0.display())]
    DirectoryAlreadyExists(PathBuf),

    #[error("no master data in '{}' and no master file to read", .0.display())]
    MissingMasterData(PathBuf),

    #[error("'{0}' is not a recognized checklist file")]
    UnrecognizedFileKind(String),

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl TaxonomyError {
    pub fn format(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        TaxonomyError::Format {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TaxonomyError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        TaxonomyError::Json {
            path: path.into(),
            source,
        }
    }

    /// Process exit code the command-line tools report for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            TaxonomyError::MissingMasterData(_) => 1,
            TaxonomyError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => 2,
            TaxonomyError::DirectoryAlreadyExists(_) => 3,
            TaxonomyError::Format { .. } | TaxonomyError::UnrecognizedFileKind(_) => 4,
            TaxonomyError::DuplicateKind { .. } => 5,
            TaxonomyError::VersionMismatch { .. } => 6,
            TaxonomyError::StructuralOrder { .. } => 7,
            TaxonomyError::Io { .. } | TaxonomyError::Json { .. } => 8,
        }
    }
}
