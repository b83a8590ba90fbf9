//! Map pin entity.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinId(Uuid);

impl PinId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for PinId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PinId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl std::str::FromStr for PinId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A saved location. Pins are immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    id: PinId,
    coordinate: Coordinate,
    created_at: DateTime<Utc>,
}

impl Pin {
    /// Creates a new pin stamped with the current time.
    #[must_use]
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            id: PinId::generate(),
            coordinate,
            // Stores keep microsecond precision.
            created_at: Utc::now().trunc_subsecs(6),
        }
    }

    /// Rebuilds a pin from stored parts.
    #[must_use]
    pub const fn from_parts(id: PinId, coordinate: Coordinate, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            coordinate,
            created_at,
        }
    }

    #[must_use]
    pub const fn id(&self) -> PinId {
        self.id
    }

    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
