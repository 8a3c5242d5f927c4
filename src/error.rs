use thiserror::Error;

/// Errors returned by this crate.
///
/// `Io`, `Csv`, `Pattern` and `EmptyDataset` mean the dataset could not be
/// loaded and are fatal. `EmptyResult` means a question was understood but matched no
/// rows; it carries the rendered "no data found" answer.
#[derive(Error, Debug)]
pub enum Error {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("invalid phrase pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("{0}: no usable rows")]
    EmptyDataset(String),

    #[error("{0}")]
    EmptyResult(String),
}

impl Error {
    /// Reports whether this error means the dataset could not be loaded.
    #[must_use]
    pub fn is_load_error(&self) -> bool {
        !matches!(self, Self::EmptyResult(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
