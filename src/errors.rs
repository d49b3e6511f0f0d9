//! Centralized error handling for blockwise
//!
//! Every public operation returns [`Result`]. Errors raised inside a worker are
//! wrapped with the block that produced them so a failing block can be
//! reproduced on its own.

use std::fmt;

/// Main error type for blockwise operations
#[derive(Debug)]
pub enum BlockwiseError {
    /// Malformed array, block, mask or output shape
    InvalidShape { message: String },

    /// A per-block computation failed
    WorkerFailure {
        block: usize,
        coords: Vec<usize>,
        source: Box<BlockwiseError>,
    },

    /// Negative or otherwise out-of-domain label value
    InvalidLabel {
        block: Option<Vec<usize>>,
        message: String,
    },

    /// Result ids do not fit into the output element type
    LabelOverflow { max_id: u64 },

    /// Worker pool configuration error
    ThreadPoolError(String),

    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Variable not found in NetCDF file
    VariableNotFound { var: String },

    /// Free-form error, mostly raised by caller-supplied collaborators
    Generic(String),
}

impl BlockwiseError {
    pub(crate) fn invalid_shape(message: impl Into<String>) -> Self {
        BlockwiseError::InvalidShape {
            message: message.into(),
        }
    }

    /// The innermost error, unwrapping nested worker failures.
    #[must_use]
    pub fn root_cause(&self) -> &BlockwiseError {
        match self {
            BlockwiseError::WorkerFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Block-grid coordinate of the failing block, if the error carries one.
    #[must_use]
    pub fn block_coords(&self) -> Option<&[usize]> {
        match self {
            BlockwiseError::WorkerFailure { coords, .. } => Some(coords),
            BlockwiseError::InvalidLabel { block, .. } => block.as_deref(),
            _ => None,
        }
    }

    /// Recasts a failure of the local labeling phase as [`BlockwiseError::InvalidLabel`].
    pub(crate) fn into_label_error(self) -> Self {
        match self {
            BlockwiseError::WorkerFailure { coords, source, .. } => {
                let message = match *source {
                    BlockwiseError::InvalidLabel { message, .. } => message,
                    other => other.to_string(),
                };
                BlockwiseError::InvalidLabel {
                    block: Some(coords),
                    message,
                }
            }
            other => other,
        }
    }
}

impl fmt::Display for BlockwiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockwiseError::InvalidShape { message } => write!(f, "Invalid shape: {}", message),
            BlockwiseError::WorkerFailure {
                block,
                coords,
                source,
            } => write!(
                f,
                "Worker failed on block {} at grid position {:?}: {}",
                block, coords, source
            ),
            BlockwiseError::InvalidLabel { block, message } => match block {
                Some(coords) => write!(f, "Invalid label in block {:?}: {}", coords, message),
                None => write!(f, "Invalid label: {}", message),
            },
            BlockwiseError::LabelOverflow { max_id } => write!(
                f,
                "Label id {} does not fit into the output element type",
                max_id
            ),
            BlockwiseError::ThreadPoolError(msg) => write!(f, "Thread pool error: {}", msg),
            BlockwiseError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            BlockwiseError::IoError(e) => write!(f, "I/O error: {}", e),
            BlockwiseError::ArrayError(e) => write!(f, "Array error: {}", e),
            BlockwiseError::VariableNotFound { var } => {
                write!(f, "Variable '{}' not found in file", var)
            }
            BlockwiseError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for BlockwiseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BlockwiseError::WorkerFailure { source, .. } => Some(source.as_ref()),
            BlockwiseError::NetCDFError(e) => Some(e),
            BlockwiseError::IoError(e) => Some(e),
            BlockwiseError::ArrayError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for BlockwiseError {
    fn from(error: netcdf::Error) -> Self {
        BlockwiseError::NetCDFError(error)
    }
}

impl From<std::io::Error> for BlockwiseError {
    fn from(error: std::io::Error) -> Self {
        BlockwiseError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for BlockwiseError {
    fn from(error: ndarray::ShapeError) -> Self {
        BlockwiseError::ArrayError(error)
    }
}

impl From<String> for BlockwiseError {
    fn from(error: String) -> Self {
        BlockwiseError::Generic(error)
    }
}

impl From<&str> for BlockwiseError {
    fn from(error: &str) -> Self {
        BlockwiseError::Generic(error.to_string())
    }
}

/// Result type alias for blockwise operations
pub type Result<T> = std::result::Result<T, BlockwiseError>;
