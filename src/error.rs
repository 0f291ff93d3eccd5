use std::fmt;

/// Invalid chunking or reducer parameters. Raised before any reduction runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    ZeroChunkSize,
    ChunkSizeExceedsSamples { chunk_size: usize, available: usize },
    ChunkShiftTooSmall { chunk_shift: usize, chunk_size: usize },
    InvalidSigma { name: &'static str, value: f64 },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::ZeroChunkSize => write!(f, "chunk size must be at least 1"),
            ConfigurationError::ChunkSizeExceedsSamples {
                chunk_size,
                available,
            } => write!(
                f,
                "chunk size exceeds available samples ({} > {})",
                chunk_size, available
            ),
            ConfigurationError::ChunkShiftTooSmall {
                chunk_shift,
                chunk_size,
            } => write!(
                f,
                "chunk shift must not be smaller than chunk size ({} < {})",
                chunk_shift, chunk_size
            ),
            ConfigurationError::InvalidSigma { name, value } => {
                write!(f, "{} must be a positive finite number, got {}", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// A sample series that violates its structural invariants.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesError {
    NonIncreasingTimestamp { index: usize },
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
    ShapeMismatch {
        column: String,
        index: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },
    MaskWithoutColumn(String),
}

impl fmt::Display for SeriesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesError::NonIncreasingTimestamp { index } => {
                write!(f, "timestamp at index {} is not later than its predecessor", index)
            }
            SeriesError::LengthMismatch {
                column,
                expected,
                found,
            } => write!(
                f,
                "column '{}' has {} entries but the series has {} timestamps",
                column, found, expected
            ),
            SeriesError::ShapeMismatch {
                column,
                index,
                expected,
                found,
            } => write!(
                f,
                "column '{}' entry {} has shape {}x{}, expected {}x{}",
                column, index, found.0, found.1, expected.0, expected.1
            ),
            SeriesError::MaskWithoutColumn(column) => {
                write!(f, "mask given for unknown column '{}'", column)
            }
        }
    }
}

impl std::error::Error for SeriesError {}

/// Failure of a whole extraction call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    Configuration(ConfigurationError),
    UnknownColumn(String),
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::Configuration(e) => write!(f, "invalid configuration: {}", e),
            ExtractionError::UnknownColumn(name) => write!(f, "no column named '{}'", name),
        }
    }
}

impl std::error::Error for ExtractionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractionError::Configuration(e) => Some(e),
            ExtractionError::UnknownColumn(_) => None,
        }
    }
}

impl From<ConfigurationError> for ExtractionError {
    fn from(e: ConfigurationError) -> Self {
        ExtractionError::Configuration(e)
    }
}
