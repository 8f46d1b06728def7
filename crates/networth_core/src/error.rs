use std::fmt;

/// Malformed simulation input.
///
/// Raised before any path is simulated. These are never retried and never
/// silently corrected.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidParameterError {
    /// A Monte Carlo run was requested with zero paths
    ZeroPathCount,
    /// No asset buckets were configured
    NoBuckets,
    /// A bucket allocation weight is negative or not finite
    InvalidWeight { bucket: String, weight: f64 },
    /// Allocation weights do not sum to one
    WeightsDoNotSumToOne { sum: f64 },
    /// A volatility / scale parameter is negative
    NegativeVolatility {
        profile_type: &'static str,
        std_dev: f64,
    },
    /// A distribution could not be constructed from its parameters
    InvalidDistributionParameters {
        profile_type: &'static str,
        mean: f64,
        std_dev: f64,
        reason: &'static str,
    },
    /// Historical data is empty and cannot be sampled
    EmptyHistoricalData { name: String },
    /// Block bootstrap with a zero block size
    ZeroBlockSize,
    /// A probability outside `[0, 1]`
    InvalidProbability { field: &'static str, value: f64 },
    /// A numeric field is NaN or infinite
    NonFinite { field: String, value: f64 },
    /// A monetary field that must be non-negative is negative
    NegativeAmount { field: String, value: f64 },
    /// A cash flow or policy window ends before it starts
    InvalidWindow {
        name: String,
        start: usize,
        end: usize,
    },
    /// A custom withdrawal order names a bucket that does not exist
    UnknownBucket(String),
    /// Two buckets share a name
    DuplicateBucket(String),
    /// A property is sold before (or in the same period as) it is bought
    InvalidPropertyDates {
        name: String,
        purchase: usize,
        sale: usize,
    },
    /// Loan with zero term or a principal above the property value
    InvalidLoan { property: String, reason: &'static str },
    /// Progressive tax brackets are not sorted by threshold
    UnsortedTaxBrackets,
    /// A supplied draw sequence does not cover the horizon
    DrawSequenceTooShort { expected: usize, actual: usize },
    /// A period draw carries the wrong number of bucket returns
    DrawBucketMismatch {
        period: usize,
        expected: usize,
        actual: usize,
    },
    /// A requested percentile is outside `[0, 100]`
    InvalidPercentile(f64),
    /// A regime of a regime-switching model keeps state between draws
    StatefulRegime { regime: &'static str },
}

impl fmt::Display for InvalidParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPathCount => write!(f, "path count must be greater than zero"),
            Self::NoBuckets => write!(f, "at least one asset bucket is required"),
            Self::InvalidWeight { bucket, weight } => {
                write!(f, "bucket {bucket:?} has invalid allocation weight {weight}")
            }
            Self::WeightsDoNotSumToOne { sum } => {
                write!(f, "allocation weights sum to {sum}, expected 1")
            }
            Self::NegativeVolatility {
                profile_type,
                std_dev,
            } => write!(f, "{profile_type} volatility must be non-negative, got {std_dev}"),
            Self::InvalidDistributionParameters {
                profile_type,
                mean,
                std_dev,
                reason,
            } => write!(
                f,
                "invalid {profile_type} parameters (mean={mean}, std_dev={std_dev}): {reason}"
            ),
            Self::EmptyHistoricalData { name } => {
                write!(f, "historical series {name:?} is empty")
            }
            Self::ZeroBlockSize => write!(f, "bootstrap block size must be at least 1"),
            Self::InvalidProbability { field, value } => {
                write!(f, "{field} must be within [0, 1], got {value}")
            }
            Self::NonFinite { field, value } => write!(f, "{field} must be finite, got {value}"),
            Self::NegativeAmount { field, value } => {
                write!(f, "{field} must be non-negative, got {value}")
            }
            Self::InvalidWindow { name, start, end } => {
                write!(f, "{name:?} ends (period {end}) before it starts (period {start})")
            }
            Self::UnknownBucket(name) => write!(f, "unknown bucket {name:?}"),
            Self::DuplicateBucket(name) => write!(f, "bucket {name:?} is defined twice"),
            Self::InvalidPropertyDates {
                name,
                purchase,
                sale,
            } => write!(
                f,
                "property {name:?} is sold in period {sale} but bought in period {purchase}"
            ),
            Self::InvalidLoan { property, reason } => {
                write!(f, "invalid loan on property {property:?}: {reason}")
            }
            Self::UnsortedTaxBrackets => {
                write!(f, "tax brackets must be sorted by ascending threshold")
            }
            Self::DrawSequenceTooShort { expected, actual } => write!(
                f,
                "draw sequence covers {actual} periods, horizon needs {expected}"
            ),
            Self::DrawBucketMismatch {
                period,
                expected,
                actual,
            } => write!(
                f,
                "period {period} draw has {actual} bucket returns, expected {expected}"
            ),
            Self::InvalidPercentile(p) => write!(f, "percentile {p} is outside [0, 100]"),
            Self::StatefulRegime { regime } => write!(
                f,
                "{regime} regime must be memoryless (i.i.d. bootstrap or a parametric profile)"
            ),
        }
    }
}

impl std::error::Error for InvalidParameterError {}

/// Errors surfaced by a simulation run
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    InvalidParameter(InvalidParameterError),
    /// The run was cancelled through its progress handle
    Cancelled,
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::InvalidParameter(e) => write!(f, "invalid parameter: {e}"),
            SimulationError::Cancelled => write!(f, "simulation cancelled"),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::InvalidParameter(e) => Some(e),
            SimulationError::Cancelled => None,
        }
    }
}

impl From<InvalidParameterError> for SimulationError {
    fn from(e: InvalidParameterError) -> Self {
        SimulationError::InvalidParameter(e)
    }
}

pub type Result<T> = std::result::Result<T, InvalidParameterError>;
