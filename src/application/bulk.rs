//! Bulk command execution against an entity store
//!
//! Runs one async operation per entity under a command-level lock and turns
//! whatever happens (accepted, refused, failed, too slow) into entity
//! outcomes before building the [`BulkOutcome`].

use std::collections::HashSet;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::Mutex;
use tokio::time::{timeout, Instant};
use tracing::{info, warn};

use crate::config::PushConfig;
use crate::domain::ids::RequestContext;
use crate::domain::outcome::{BulkOutcome, EntityOutcome, OutcomeKind};
use crate::support::logging::millis;

/// Executes bulk commands one at a time.
///
/// The lock serializes bulk commands sharing this executor; a command that
/// cannot get it within `lock_timeout` touches nothing and reports
/// `LockTimeout` for every input.
pub struct BulkExecutor {
    lock: Mutex<()>,
    lock_timeout: Duration,
    entity_timeout: Duration,
}

impl BulkExecutor {
    pub fn new(lock_timeout: Duration, entity_timeout: Duration) -> Self {
        Self {
            lock: Mutex::new(()),
            lock_timeout,
            entity_timeout,
        }
    }

    pub fn from_config(config: &PushConfig) -> Self {
        Self::new(config.lock_timeout(), config.entity_timeout())
    }

    /// Apply `operation` to every distinct input.
    ///
    /// The operation reports business results as entity outcomes and faults
    /// as `Err`; faults become `Error` outcomes with the fault's message and
    /// operations running past the entity budget become `Timeout`. The bulk
    /// kind is `Success` once the command ran, whatever the entities did,
    /// and `NoOperation` for an empty input.
    pub async fn execute<E, F, Fut, Fault>(
        &self,
        ctx: &RequestContext,
        inputs: &[E],
        operation: F,
    ) -> BulkOutcome<E>
    where
        E: Clone + Eq + Hash + Debug,
        F: Fn(E) -> Fut,
        Fut: Future<Output = Result<EntityOutcome<E>, Fault>>,
        Fault: std::error::Error,
    {
        let started = Instant::now();

        let _guard = match timeout(self.lock_timeout, self.lock.lock()).await {
            Ok(guard) => guard,
            Err(_) => {
                warn!(
                    correlation_id = %ctx.correlation_id,
                    lock_timeout_ms = millis(self.lock_timeout),
                    "Bulk command lock not acquired"
                );
                return BulkOutcome::lock_timeout(ctx, inputs, self.lock_timeout);
            }
        };

        if inputs.is_empty() {
            return BulkOutcome::no_operation(ctx, inputs).with_runtime(started.elapsed());
        }

        let mut seen = HashSet::new();
        let entities: Vec<E> = inputs
            .iter()
            .filter(|e| seen.insert(*e))
            .cloned()
            .collect();

        info!(
            correlation_id = %ctx.correlation_id,
            entities = entities.len(),
            "Executing bulk command"
        );

        let runs = entities.iter().cloned().map(|entity| {
            let pending = operation(entity.clone());
            async move { (entity, timeout(self.entity_timeout, pending).await) }
        });

        let mut successful = Vec::new();
        let mut rejected = Vec::new();
        for (entity, result) in join_all(runs).await {
            let outcome = match result {
                Ok(Ok(outcome))
                    if outcome.entity() == &entity
                        && outcome.correlation_id() == ctx.correlation_id =>
                {
                    outcome
                }
                Ok(Ok(outcome)) if outcome.entity() == &entity => {
                    warn!(
                        correlation_id = %ctx.correlation_id,
                        reported = %outcome.correlation_id(),
                        entity = ?entity,
                        "Operation reported an outcome of another request"
                    );
                    EntityOutcome::error(
                        ctx,
                        entity,
                        "Operation reported an outcome of another request",
                    )
                }
                Ok(Ok(outcome)) => {
                    warn!(
                        correlation_id = %ctx.correlation_id,
                        expected = ?entity,
                        reported = ?outcome.entity(),
                        "Operation reported an outcome for another entity"
                    );
                    EntityOutcome::error(
                        ctx,
                        entity,
                        "Operation reported an outcome for another entity",
                    )
                }
                Ok(Err(fault)) => {
                    warn!(
                        correlation_id = %ctx.correlation_id,
                        entity = ?entity,
                        error = %fault,
                        "Entity operation failed"
                    );
                    EntityOutcome::error_from(ctx, entity, &fault)
                }
                Err(_) => {
                    warn!(
                        correlation_id = %ctx.correlation_id,
                        entity = ?entity,
                        "Entity operation timed out"
                    );
                    EntityOutcome::timeout(ctx, entity, self.entity_timeout)
                }
            };

            if outcome.is_accepted() {
                successful.push(outcome);
            } else {
                rejected.push(outcome);
            }
        }

        let runtime = started.elapsed();
        info!(
            correlation_id = %ctx.correlation_id,
            successful = successful.len(),
            rejected = rejected.len(),
            elapsed_ms = millis(runtime),
            "Bulk command finished"
        );

        match BulkOutcome::new(ctx, OutcomeKind::Success, inputs, successful, rejected) {
            Ok(outcome) => outcome.with_runtime(runtime),
            Err(err) => BulkOutcome::error_from(ctx, inputs, &err).with_runtime(runtime),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::ids::EvseId;
    use crate::support::errors::ProviderError;

    fn ctx() -> RequestContext {
        RequestContext::new("evse-store")
    }

    fn evses(n: usize) -> Vec<EvseId> {
        (1..=n)
            .map(|i| EvseId::new(format!("DE*GEF*E{:04}*1", i)))
            .collect()
    }

    fn executor() -> BulkExecutor {
        BulkExecutor::from_config(&PushConfig::default())
    }

    #[tokio::test]
    async fn classifies_entity_results() {
        let ctx = ctx();
        let inputs = evses(4);
        let op_ctx = ctx.clone();
        let last = inputs[3].clone();

        let outcome = executor()
            .execute(&ctx, &inputs, |evse: EvseId| {
                let ctx = op_ctx.clone();
                let last = last.clone();
                async move {
                    if evse == last {
                        return Err(ProviderError::Other("store unavailable".to_string()));
                    }
                    let id = evse.as_str().to_owned();
                    Ok(match id.as_str() {
                        "DE*GEF*E0001*1" => EntityOutcome::success(&ctx, evse),
                        "DE*GEF*E0002*1" => EntityOutcome::no_operation(&ctx, evse),
                        _ => EntityOutcome::can_not_be_removed(&ctx, evse),
                    })
                }
            })
            .await;

        assert_eq!(outcome.kind(), OutcomeKind::Success);
        assert_eq!(outcome.len(), 4);
        assert_eq!(outcome.successful().len(), 2);
        assert_eq!(outcome.rejected().len(), 2);
        assert_eq!(outcome.correlation_id(), ctx.correlation_id);

        let failed = outcome
            .rejected()
            .iter()
            .find(|o| o.kind() == OutcomeKind::Error)
            .unwrap();
        assert_eq!(failed.description(), "store unavailable");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_entity_becomes_timeout() {
        let ctx = ctx();
        let inputs = evses(2);
        let op_ctx = ctx.clone();
        let slow = inputs[1].clone();

        let outcome = executor()
            .execute(&ctx, &inputs, |evse: EvseId| {
                let ctx = op_ctx.clone();
                let slow = slow.clone();
                async move {
                    if evse == slow {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                    }
                    Ok::<_, ProviderError>(EntityOutcome::success(&ctx, evse))
                }
            })
            .await;

        assert_eq!(outcome.successful().len(), 1);
        assert_eq!(outcome.rejected().len(), 1);
        let timed_out = &outcome.rejected()[0];
        assert_eq!(timed_out.entity(), &inputs[1]);
        assert_eq!(timed_out.kind(), OutcomeKind::Timeout);
        assert!(timed_out.description().contains("10"));
    }

    #[tokio::test(start_paused = true)]
    async fn busy_lock_gives_lock_timeout() {
        let ctx = ctx();
        let inputs = evses(3);
        let executor = BulkExecutor::new(Duration::from_secs(1), Duration::from_secs(10));
        let _held = executor.lock.lock().await;

        let outcome = executor
            .execute(&ctx, &inputs, |evse: EvseId| {
                let ctx = ctx.clone();
                async move { Ok::<_, ProviderError>(EntityOutcome::success(&ctx, evse)) }
            })
            .await;

        assert_eq!(outcome.kind(), OutcomeKind::LockTimeout);
        assert!(outcome.successful().is_empty());
        assert_eq!(outcome.rejected().len(), 3);
    }

    #[tokio::test]
    async fn misattributed_outcome_is_error() {
        let ctx = ctx();
        let inputs = evses(1);
        let stranger = EvseId::new("DE*GEF*E9999*1");
        let op_ctx = ctx.clone();

        let outcome = executor()
            .execute(&ctx, &inputs, |_evse: EvseId| {
                let ctx = op_ctx.clone();
                let stranger = stranger.clone();
                async move { Ok::<_, ProviderError>(EntityOutcome::success(&ctx, stranger)) }
            })
            .await;

        assert_eq!(outcome.rejected().len(), 1);
        assert_eq!(outcome.rejected()[0].entity(), &inputs[0]);
        assert_eq!(outcome.rejected()[0].kind(), OutcomeKind::Error);
    }

    #[tokio::test]
    async fn outcome_of_another_request_is_error() {
        let ctx = ctx();
        let inputs = evses(2);
        let other = RequestContext::new("evse-store");
        let op_ctx = ctx.clone();
        let stale = inputs[1].clone();

        let outcome = executor()
            .execute(&ctx, &inputs, |evse: EvseId| {
                let ctx = if evse == stale { other.clone() } else { op_ctx.clone() };
                async move { Ok::<_, ProviderError>(EntityOutcome::success(&ctx, evse)) }
            })
            .await;

        assert_eq!(outcome.kind(), OutcomeKind::Success);
        assert_eq!(outcome.successful().len(), 1);
        assert_eq!(outcome.rejected().len(), 1);
        let rejected = &outcome.rejected()[0];
        assert_eq!(rejected.entity(), &inputs[1]);
        assert_eq!(rejected.kind(), OutcomeKind::Error);
        assert_eq!(rejected.correlation_id(), ctx.correlation_id);
    }

    #[tokio::test]
    async fn empty_input_is_no_operation() {
        let ctx = ctx();
        let outcome = executor()
            .execute(&ctx, &[], |evse: EvseId| {
                let ctx = ctx.clone();
                async move { Ok::<_, ProviderError>(EntityOutcome::success(&ctx, evse)) }
            })
            .await;
        assert_eq!(outcome.kind(), OutcomeKind::NoOperation);
        assert!(outcome.is_empty());
    }
}
