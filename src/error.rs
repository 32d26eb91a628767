//! Error types for the safe binding.
//!
//! The flattened entry points in [`crate::flat`] never produce these; they
//! return the library's [`ExceptionCode`] as-is.

use thiserror::Error;

use crate::ffi::ExceptionCode;

/// Result type alias for vship-flat operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of a comparison an input belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    /// The reference image.
    Source,
    /// The image being scored against the reference.
    Distorted,
}

impl std::fmt::Display for ImageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Distorted => write!(f, "distorted"),
        }
    }
}

/// Errors that can occur when driving libvship through the safe API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// libvship returned a non-zero status.
    #[error("vship {code}: {message}")]
    Vship {
        /// Status as returned by the library.
        code: ExceptionCode,
        /// The library's description of the status.
        message: String,
    },

    /// Plane 0 of an image was not supplied.
    #[error("{image} image is missing plane {plane}")]
    MissingPlane {
        /// Image the plane belongs to.
        image: ImageRole,
        /// Plane index.
        plane: usize,
    },

    /// A plane stride is shorter than one row of samples.
    #[error("{image} plane {plane}: stride {stride} is shorter than a {row_bytes}-byte row")]
    InvalidStride {
        /// Image the plane belongs to.
        image: ImageRole,
        /// Plane index.
        plane: usize,
        /// Stride in bytes.
        stride: i64,
        /// Bytes occupied by one row of samples.
        row_bytes: u64,
    },

    /// A plane buffer does not cover `stride * rows` bytes.
    #[error("{image} plane {plane}: {actual} bytes supplied, {required} required")]
    PlaneTooSmall {
        /// Image the plane belongs to.
        image: ImageRole,
        /// Plane index.
        plane: usize,
        /// Bytes the declared geometry needs.
        required: u64,
        /// Bytes actually supplied.
        actual: usize,
    },

    /// A difference map is smaller than the map the metric writes.
    #[error("Difference map is {actual:?}, metric writes {required:?}")]
    DiffMapTooSmall {
        /// Required (width, height).
        required: (usize, usize),
        /// Supplied (width, height).
        actual: (usize, usize),
    },

    /// A string passed to the library contained an interior NUL byte.
    #[error("Invalid string argument: {0}")]
    InvalidString(#[from] std::ffi::NulError),

    /// A path handed to the library is not valid UTF-8.
    #[error("Path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// The libvship status behind this error, if it came from the library.
    #[must_use]
    pub fn exception_code(&self) -> Option<ExceptionCode> {
        match self {
            Self::Vship { code, .. } => Some(*code),
            _ => None,
        }
    }
}
