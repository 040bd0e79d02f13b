use core::fmt;

/// Result alias for `vq`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by codebook training and quantization.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Universe contains no vectors.
    EmptyUniverse,

    /// Vector dimension mismatch.
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid codebook size requested (zero, or larger than the universe).
    InvalidCodebookSize {
        /// Requested number of codewords.
        requested: usize,
        /// Number of universe vectors.
        n_vectors: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// I/O failure while loading a universe.
    Io(String),

    /// A universe row that could not be parsed.
    MalformedRow {
        /// 1-based line number.
        line: usize,
        /// Error message.
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyUniverse => write!(f, "universe contains no vectors"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::InvalidCodebookSize {
                requested,
                n_vectors,
            } => {
                write!(
                    f,
                    "cannot build a {requested}-entry codebook from {n_vectors} vectors"
                )
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::Io(msg) => write!(f, "io error: {msg}"),
            Error::MalformedRow { line, message } => {
                write!(f, "malformed row at line {line}: {message}")
            }
        }
    }
}

impl std::error::Error for Error {}
