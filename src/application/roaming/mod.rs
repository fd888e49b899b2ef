//! Pushing commands to roaming providers
//!
//! - [`PushClient`]: port implemented by protocol clients
//! - [`RoamingProviderRegistry`]: explicit set of providers, built from config
//! - [`FanOutPusher`]: concurrent push to every provider, merged into one outcome

pub mod client;
pub mod fan_out;
pub mod registry;

pub use client::{PushClient, PushItems};
pub use fan_out::FanOutPusher;
pub use registry::{ProviderSlot, RoamingProviderRegistry, SharedProviderRegistry};

use crate::domain::ids::RoamingProviderId;
use crate::domain::outcome::DestinationOutcome;
use crate::domain::status::EvseStatusUpdate;

/// A batch of EVSE status updates pushed as one command
pub type StatusPush = Vec<EvseStatusUpdate>;

/// Outcome of pushing a [`StatusPush`] to one provider, or to all of them
pub type StatusPushOutcome = DestinationOutcome<RoamingProviderId, EvseStatusUpdate>;

pub type StatusPushClient = dyn PushClient<StatusPush, EvseStatusUpdate>;
