//! EVSE status updates pushed to roaming partners

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::EvseId;

/// EVSE status as reported to roaming partners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvseStatus {
    Available,
    Reserved,
    Charging,
    OutOfService,
    Offline,
    Unknown,
}

/// One status change of one EVSE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvseStatusUpdate {
    pub evse_id: EvseId,
    pub status: EvseStatus,
    pub timestamp: DateTime<Utc>,
}

impl EvseStatusUpdate {
    pub fn new(evse_id: impl Into<EvseId>, status: EvseStatus) -> Self {
        Self {
            evse_id: evse_id.into(),
            status,
            timestamp: Utc::now(),
        }
    }
}
