//! Identifiers of roaming-network entities and requests

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Charging station operator, e.g. `DE*GEF`
    ChargingStationOperatorId
);
string_id!(ChargingPoolId);
string_id!(ChargingStationId);
string_id!(
    /// EVSE, e.g. `DE*GEF*E1234*1`
    EvseId
);
string_id!(
    /// Roaming partner a command can be pushed to
    RoamingProviderId
);
string_id!(
    /// Component that produced an outcome
    SenderId
);

/// Opaque token shared by every outcome of one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who is asking and under which correlation id.
///
/// Created once per logical request and passed to every outcome built
/// while serving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub correlation_id: CorrelationId,
    pub sender: SenderId,
}

impl RequestContext {
    /// New request with a fresh correlation id
    pub fn new(sender: impl Into<SenderId>) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            sender: sender.into(),
        }
    }

    pub fn with_correlation_id(sender: impl Into<SenderId>, correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            sender: sender.into(),
        }
    }
}
