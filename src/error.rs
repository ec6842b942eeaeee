use core::fmt;

/// Result alias for `inkdigits`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by clustering and normalization primitives.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Length or column-count mismatch.
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid number of clusters requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Downscaled digit does not fit the interior content box.
    ///
    /// Signals a bug in the aspect-preserving resize, never bad user input.
    ContentTooLarge {
        /// Width after resampling.
        width: u32,
        /// Height after resampling.
        height: u32,
        /// Side of the content box.
        max: u32,
    },

    /// Error reported by the `image` crate.
    Image(String),

    /// Generic error with message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} clusters from {n_items} items")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::ContentTooLarge { width, height, max } => {
                write!(
                    f,
                    "wrong image size {width}x{height}: content must fit in {max}x{max}"
                )
            }
            Error::Image(msg) => write!(f, "image error: {msg}"),
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}
