use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatasetError>;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    ResolveCategory,
    ResolveSplit,
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extract => "extract",
            Stage::ResolveCategory => "resolve-category",
            Stage::ResolveSplit => "resolve-split",
            Stage::Load => "load",
        };
        write!(f, "{}", name)
    }
}

/// Coarse error class, independent of the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    PermissionDenied,
    CorruptArchive,
    Io,
    Decode,
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("extract: archive {} not found or unreadable: {source}", path.display())]
    ArchiveNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("extract: destination {} is not writable: {source}", path.display())]
    DestinationNotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("extract: archive {} is corrupt: {source}", path.display())]
    CorruptArchive {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("extract: failed writing into {}: {source}", path.display())]
    ExtractIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("resolve-category: invalid category name {0:?}")]
    InvalidCategory(String),
    #[error("resolve-category: category {category:?} not found at {}", path.display())]
    CategoryNotFound { category: String, path: PathBuf },
    #[error("resolve-split: unknown split {0:?} (expected train, test or ground_truth)")]
    InvalidSplit(String),
    #[error("resolve-split: split directory {} not found", path.display())]
    SplitNotFound { path: PathBuf },
    #[error("resolve-split: failed listing {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("load: index {index} out of range for split of {len} images")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("load: failed decoding {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl DatasetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatasetError::ArchiveNotFound { .. }
            | DatasetError::CategoryNotFound { .. }
            | DatasetError::SplitNotFound { .. } => ErrorKind::NotFound,
            DatasetError::InvalidCategory(_)
            | DatasetError::InvalidSplit(_)
            | DatasetError::IndexOutOfRange { .. } => ErrorKind::InvalidArgument,
            DatasetError::DestinationNotWritable { .. } => ErrorKind::PermissionDenied,
            DatasetError::CorruptArchive { .. } => ErrorKind::CorruptArchive,
            DatasetError::ExtractIo { .. } | DatasetError::Scan { .. } => ErrorKind::Io,
            DatasetError::Decode { .. } => ErrorKind::Decode,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            DatasetError::ArchiveNotFound { .. }
            | DatasetError::DestinationNotWritable { .. }
            | DatasetError::CorruptArchive { .. }
            | DatasetError::ExtractIo { .. } => Stage::Extract,
            DatasetError::InvalidCategory(_) | DatasetError::CategoryNotFound { .. } => {
                Stage::ResolveCategory
            }
            DatasetError::InvalidSplit(_)
            | DatasetError::SplitNotFound { .. }
            | DatasetError::Scan { .. } => Stage::ResolveSplit,
            DatasetError::IndexOutOfRange { .. } | DatasetError::Decode { .. } => Stage::Load,
        }
    }
}
