//! Visible map region remembered between sessions.

use serde::{Deserialize, Serialize};

use super::Coordinate;
use crate::domain::errors::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapRegion {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl MapRegion {
    /// Creates a region centred on `center`.
    ///
    /// # Errors
    /// Returns error if a span is negative or not finite.
    pub fn new(
        center: Coordinate,
        latitude_delta: f64,
        longitude_delta: f64,
    ) -> Result<Self, ValidationError> {
        for span in [latitude_delta, longitude_delta] {
            if !span.is_finite() {
                return Err(ValidationError::NotFinite);
            }
            if span < 0.0 {
                return Err(ValidationError::NegativeSpan(span));
            }
        }

        Ok(Self {
            latitude: center.latitude(),
            longitude: center.longitude(),
            latitude_delta,
            longitude_delta,
        })
    }
}
