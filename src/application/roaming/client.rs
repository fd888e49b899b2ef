//! Port to roaming provider clients
//!
//! Concrete protocol clients (OICP, OCPI, ...) live outside this crate and
//! plug in through [`PushClient`].

use async_trait::async_trait;

use crate::domain::ids::{RequestContext, RoamingProviderId};
use crate::domain::outcome::DestinationOutcome;
use crate::support::errors::ProviderError;

/// A roaming provider that accepts pushes of command `C`.
///
/// `T` is the item type the provider may reject individually. A client
/// answers business results (accepted, refused, partner-side timeout) as
/// outcomes and returns `Err` only for faults; the fan-out turns faults into
/// `Error` outcomes.
#[async_trait]
pub trait PushClient<C, T>: Send + Sync {
    fn provider_id(&self) -> &RoamingProviderId;

    async fn push(
        &self,
        ctx: &RequestContext,
        command: &C,
    ) -> Result<DestinationOutcome<RoamingProviderId, T>, ProviderError>;
}

/// Items of a command that a destination can reject one by one.
///
/// When the fan-out answers for a provider itself (no reply in time,
/// cancelled, fault, disabled) none of the items reached it, so all of
/// them are reported as rejected.
pub trait PushItems<T> {
    fn items(&self) -> Vec<T>;
}

impl<T: Clone> PushItems<T> for Vec<T> {
    fn items(&self) -> Vec<T> {
        self.clone()
    }
}
