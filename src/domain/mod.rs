//! Roaming-network domain: identifiers, status updates and command outcomes

pub mod ids;
pub mod outcome;
pub mod status;

pub use ids::{
    ChargingPoolId, ChargingStationId, ChargingStationOperatorId, CorrelationId, EvseId,
    RequestContext, RoamingProviderId, SenderId,
};
pub use outcome::{
    BulkOutcome, DestinationOutcome, DestinationSummary, EntityOutcome, OutcomeKind, Warnings,
};
pub use status::{EvseStatus, EvseStatusUpdate};
