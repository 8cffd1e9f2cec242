use std::path::PathBuf;

use thiserror::Error;

use super::loader::FormatError;

/// Errors surfaced by the annotation store.
///
/// Nothing here is retried; every variant reaches the operator.
#[derive(Debug, Error)]
pub enum Error {
    #[error("recording '{name}' not found in {}", .dir.display())]
    NotFound { name: String, dir: PathBuf },

    #[error("storage area {} is unavailable: {source}", .path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    /// A storage format rejected the vector being written. Plain I/O
    /// failures while writing are [`Error::Io`].
    #[error("failed to write {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    /// The data file moved but its annotation file did not. Needs manual
    /// reconciliation: the data file now lives at `data_to`, the annotations
    /// are still at `annotation_from`.
    #[error(
        "renamed {} to {} but failed to move annotations {} to {}: {source}",
        .data_from.display(),
        .data_to.display(),
        .annotation_from.display(),
        .annotation_to.display()
    )]
    PartialRename {
        data_from: PathBuf,
        data_to: PathBuf,
        annotation_from: PathBuf,
        annotation_to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("export blocked: {missing} unannotated point(s) remain")]
    Validation { missing: usize },

    #[error("no recordings match pointing scope '{scope}'")]
    EmptyScope { scope: String },

    #[error("annotations for '{name}' have {found} entries but the series has {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("{count} selected position(s) outside 0..{len}")]
    IndexOutOfRange { count: usize, len: usize },

    #[error("label {0} is not a valid HMM state")]
    InvalidLabel(i64),

    #[error("no recording is selected")]
    NoCurrentFile,
}

pub type Result<T> = std::result::Result<T, Error>;
