//! Fan-out of one command to every registered roaming provider
//!
//! ```text
//! push(ctx, command)
//!   │  slots() sorted by provider id
//!   ├─► slot 0: tokio task ─► client.push ─┐
//!   ├─► slot 1: disabled   ─► AdminDown    ├─► outcomes[slot] ─► merge_destinations
//!   └─► slot n: tokio task ─► client.push ─┘
//!        budget elapsed / cancelled ─► Timeout
//! ```
//!
//! Results are stored by slot index, never by completion order, and every
//! slot yields exactly one outcome. Outcomes produced here on behalf of a
//! provider carry all command items as rejected; replies naming another
//! provider or another request are replaced by `Error`.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

use super::client::{PushClient, PushItems};
use super::registry::SharedProviderRegistry;
use crate::application::merge::merge_destinations;
use crate::config::PushConfig;
use crate::domain::ids::{RequestContext, RoamingProviderId};
use crate::domain::outcome::text::format_seconds;
use crate::domain::outcome::DestinationOutcome;
use crate::support::cancel::CancelSignal;
use crate::support::errors::ProviderError;
use crate::support::logging::millis;

type PushResult<T> = Result<DestinationOutcome<RoamingProviderId, T>, ProviderError>;

/// Record push latency and aggregate kind.
fn record_push(kind: &'static str, elapsed: Duration) {
    metrics::histogram!("roaming_push_latency_seconds", "kind" => kind)
        .record(elapsed.as_secs_f64());
    metrics::counter!("roaming_push_total", "kind" => kind).increment(1);
}

enum Slot<T> {
    Disabled(RoamingProviderId),
    Running(RoamingProviderId, JoinHandle<PushResult<T>>),
}

/// Pushes commands to all providers of a registry and merges the answers.
pub struct FanOutPusher<C, T> {
    registry: SharedProviderRegistry<C, T>,
    budget: Duration,
}

impl<C, T> FanOutPusher<C, T>
where
    C: PushItems<T> + Send + Sync + 'static,
    T: Clone + Send + 'static,
{
    /// `budget` bounds the whole fan-out, not each provider separately.
    pub fn new(registry: SharedProviderRegistry<C, T>, budget: Duration) -> Self {
        Self { registry, budget }
    }

    pub fn from_config(registry: SharedProviderRegistry<C, T>, config: &PushConfig) -> Self {
        Self::new(registry, config.timeout())
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub async fn push(
        &self,
        ctx: &RequestContext,
        command: Arc<C>,
    ) -> DestinationOutcome<RoamingProviderId, T> {
        self.push_with_cancel(ctx, command, &CancelSignal::new()).await
    }

    /// Like [`push`](Self::push), but slots still waiting when `cancel`
    /// fires are reported as `Timeout`.
    pub async fn push_with_cancel(
        &self,
        ctx: &RequestContext,
        command: Arc<C>,
        cancel: &CancelSignal,
    ) -> DestinationOutcome<RoamingProviderId, T> {
        let started = Instant::now();
        let deadline = started + self.budget;

        let slots: Vec<Slot<T>> = self
            .registry
            .slots()
            .into_iter()
            .map(|slot| match slot.client {
                Some(client) => {
                    let handle = spawn_push(client, ctx.clone(), command.clone());
                    Slot::Running(slot.provider_id, handle)
                }
                None => Slot::Disabled(slot.provider_id),
            })
            .collect();

        info!(
            correlation_id = %ctx.correlation_id,
            destinations = slots.len(),
            budget_ms = millis(self.budget),
            "Pushing to roaming providers"
        );

        let waits = slots
            .into_iter()
            .map(|slot| self.collect(ctx, &command, slot, deadline, started, cancel));
        let outcomes = join_all(waits).await;

        let elapsed = started.elapsed();
        let merged = merge_destinations(ctx, &outcomes, elapsed);

        record_push(merged.kind().as_str(), elapsed);
        info!(
            correlation_id = %ctx.correlation_id,
            kind = %merged.kind(),
            rejected_items = merged.rejected_items().len(),
            elapsed_ms = millis(elapsed),
            "Push finished"
        );
        merged
    }

    /// Wait for one slot and turn whatever happened into an outcome.
    async fn collect(
        &self,
        ctx: &RequestContext,
        command: &C,
        slot: Slot<T>,
        deadline: Instant,
        started: Instant,
        cancel: &CancelSignal,
    ) -> DestinationOutcome<RoamingProviderId, T> {
        let (provider, handle) = match slot {
            Slot::Disabled(provider) => {
                info!(
                    correlation_id = %ctx.correlation_id,
                    provider = %provider,
                    "Roaming provider disabled, not contacted"
                );
                return DestinationOutcome::admin_down(ctx, provider)
                    .with_rejected_items(command.items());
            }
            Slot::Running(provider, handle) => (provider, handle),
        };

        let abort = handle.abort_handle();
        tokio::select! {
            biased;
            joined = timeout_at(deadline, handle) => match joined {
                Ok(Ok(Ok(outcome))) => vet_reply(ctx, provider, outcome, command),
                Ok(Ok(Err(fault))) => {
                    warn!(
                        correlation_id = %ctx.correlation_id,
                        provider = %provider,
                        error = %fault,
                        "Roaming provider push failed"
                    );
                    DestinationOutcome::error_from(ctx, provider, &fault)
                        .with_rejected_items(command.items())
                }
                Ok(Err(join_error)) => {
                    warn!(
                        correlation_id = %ctx.correlation_id,
                        provider = %provider,
                        error = %join_error,
                        "Roaming provider push task failed"
                    );
                    DestinationOutcome::error(ctx, provider, format!("Push task failed: {}", join_error))
                        .with_rejected_items(command.items())
                }
                Err(_) => {
                    abort.abort();
                    warn!(
                        correlation_id = %ctx.correlation_id,
                        provider = %provider,
                        "Roaming provider did not answer in time"
                    );
                    let note = format!(
                        "{} did not answer within {} seconds",
                        provider,
                        format_seconds(self.budget)
                    );
                    DestinationOutcome::timeout(ctx, provider, self.budget)
                        .with_rejected_items(command.items())
                        .with_warnings([note])
                }
            },
            _ = cancel.cancelled() => {
                abort.abort();
                let waited = started.elapsed();
                warn!(
                    correlation_id = %ctx.correlation_id,
                    provider = %provider,
                    "Push cancelled before roaming provider answered"
                );
                let note = format!("push cancelled before {} answered", provider);
                DestinationOutcome::timeout(ctx, provider, waited)
                    .with_rejected_items(command.items())
                    .with_warnings([note])
            }
        }
    }
}

/// Keep a reply only if it names the provider asked and this request.
fn vet_reply<C, T>(
    ctx: &RequestContext,
    provider: RoamingProviderId,
    outcome: DestinationOutcome<RoamingProviderId, T>,
    command: &C,
) -> DestinationOutcome<RoamingProviderId, T>
where
    C: PushItems<T>,
{
    if outcome.destination() != Some(&provider) {
        warn!(
            correlation_id = %ctx.correlation_id,
            provider = %provider,
            reported = ?outcome.destination(),
            "Roaming provider answered for another destination"
        );
        return DestinationOutcome::error(ctx, provider, "Provider answered for another destination")
            .with_rejected_items(command.items());
    }
    if outcome.correlation_id() != ctx.correlation_id {
        warn!(
            correlation_id = %ctx.correlation_id,
            provider = %provider,
            reported = %outcome.correlation_id(),
            "Roaming provider answered for another request"
        );
        return DestinationOutcome::error(ctx, provider, "Provider answered for another request")
            .with_rejected_items(command.items());
    }
    outcome
}

fn spawn_push<C, T>(
    client: Arc<dyn PushClient<C, T>>,
    ctx: RequestContext,
    command: Arc<C>,
) -> JoinHandle<PushResult<T>>
where
    C: Send + Sync + 'static,
    T: Send + 'static,
{
    tokio::spawn(async move { client.push(&ctx, &command).await })
}
