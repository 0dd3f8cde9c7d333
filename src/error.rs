use std::{fmt, path::PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("format error at byte {offset}: {kind}")]
    Format { offset: u64, kind: FormatErrorKind },

    /// A key that is not UTF-8; found when keys are decoded for the report.
    #[error("key {key:?} is not valid UTF-8")]
    InvalidUtf8 { key: String },

    #[error("table capacity of {capacity} distinct keys exceeded")]
    Capacity { capacity: usize },

    /// Key bytes no longer addressable with 32-bit offsets.
    #[error("name arena full at {bytes} bytes")]
    ArenaFull { bytes: usize },

    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub fn format(offset: u64, kind: FormatErrorKind) -> Self {
        Error::Format { offset, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatErrorKind {
    /// `len` counts the key bytes seen, which stops at the end of a worker's
    /// window when the key is longer than a whole line can be.
    KeyTooLong { len: usize },
    EmptyKey,
    MissingDelimiter,
    InvalidValue { token: Vec<u8> },
}

impl fmt::Display for FormatErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatErrorKind::KeyTooLong { len } => {
                write!(f, "key of {len} bytes exceeds the 100 byte limit")
            }
            FormatErrorKind::EmptyKey => f.write_str("empty key"),
            FormatErrorKind::MissingDelimiter => f.write_str("line has no ';' delimiter"),
            FormatErrorKind::InvalidValue { token } => {
                write!(f, "invalid value {:?}", String::from_utf8_lossy(token))
            }
        }
    }
}
