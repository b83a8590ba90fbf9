use thiserror::Error;

/// Rejected user or wire input.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("coordinate is not a finite number")]
    NotFinite,

    #[error("region span {0} is negative")]
    NegativeSpan(f64),

    #[error("invalid cache key: {0:?}")]
    InvalidCacheKey(String),
}
