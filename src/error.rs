use std::path::PathBuf;

/// Failure to produce a usable dataset. The browser logs these and stays on
/// its placeholder screen; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("reading {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("gzip decompress")]
    Gzip(#[source] std::io::Error),
    #[error("dataset is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("parsing dataset: {0}")]
    Parse(String),
    #[error("dataset root must be an object of categories, found {0}")]
    Shape(&'static str),
}

/// A name or category that the loaded dataset does not contain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("no ODF named {0:?} in any category")]
    UnknownName(String),
    #[error("no category named {0:?}")]
    UnknownCategory(String),
    #[error("{filename:?} not found in category {category:?}")]
    NotInCategory { category: String, filename: String },
}
