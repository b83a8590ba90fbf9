use serde::{Deserialize, Serialize};

use crate::domain::entities::{MapRegion, PinId};

/// Session state configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateConfig {
    /// Last pin whose album was opened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_pin_id: Option<PinId>,

    /// Last visible map region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_region: Option<MapRegion>,
}
