// Error taxonomy for the sonification pipeline.
//
// Every stage returns `Result<T>` and propagates with `?`. Nothing is retried
// and nothing is recovered: a failure in any stage aborts the resolution being
// rendered, and in `Mode::All` it also aborts the resolutions after it.
//
// The three kinds a caller cares about are parse failures (a bad numeric
// cell), invalid arguments (bad step, index range, mode selector, tempo,
// velocity, empty series) and I/O failures (source unreadable, output
// unwritable). `Csv` and `Config` carry the underlying decoder errors for the
// input file and the JSON config respectively.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SonifyError {
    /// A cell inside the monthly column window is not a finite number.
    #[error("row {row}, column {column}: cannot parse {cell:?} as a number")]
    Parse {
        row: usize,
        column: usize,
        cell: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SonifyError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SonifyError::InvalidArgument(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SonifyError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SonifyError>;
