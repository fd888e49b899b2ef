//! Result of one command applied to one entity

use std::time::Duration;

use serde::Serialize;

use super::kind::OutcomeKind;
use super::text::{lock_timeout_description, normalize_description, timeout_description, Warnings};
use crate::domain::ids::{CorrelationId, RequestContext, SenderId};
use crate::support::errors::OutcomeError;

/// Outcome of a single-entity command.
///
/// `E` is the reference type of the entity (an [`EvseId`](crate::domain::EvseId),
/// a [`ChargingStationId`](crate::domain::ChargingStationId), ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityOutcome<E> {
    entity: E,
    kind: OutcomeKind,
    correlation_id: CorrelationId,
    sender: SenderId,
    description: String,
    warnings: Warnings,
    runtime: Option<Duration>,
}

impl<E> EntityOutcome<E> {
    /// Build an outcome of any terminal kind.
    ///
    /// Fails with [`OutcomeError::ReservedKind`] for `Partial`.
    pub fn new(
        ctx: &RequestContext,
        entity: E,
        kind: OutcomeKind,
        description: impl Into<String>,
    ) -> Result<Self, OutcomeError> {
        if !kind.is_terminal() {
            return Err(OutcomeError::ReservedKind(kind));
        }
        Ok(Self::build(ctx, entity, kind, description.into()))
    }

    pub(crate) fn build(
        ctx: &RequestContext,
        entity: E,
        kind: OutcomeKind,
        description: String,
    ) -> Self {
        Self {
            entity,
            kind,
            correlation_id: ctx.correlation_id,
            sender: ctx.sender.clone(),
            description: normalize_description(Some(description)),
            warnings: Warnings::new(),
            runtime: None,
        }
    }

    pub fn unspecified(ctx: &RequestContext, entity: E) -> Self {
        Self::build(ctx, entity, OutcomeKind::Unspecified, String::new())
    }

    pub fn success(ctx: &RequestContext, entity: E) -> Self {
        Self::build(ctx, entity, OutcomeKind::Success, String::new())
    }

    pub fn no_operation(ctx: &RequestContext, entity: E) -> Self {
        Self::build(ctx, entity, OutcomeKind::NoOperation, String::new())
    }

    pub fn enqueued(ctx: &RequestContext, entity: E) -> Self {
        Self::build(ctx, entity, OutcomeKind::Enqueued, String::new())
    }

    pub fn admin_down(ctx: &RequestContext, entity: E) -> Self {
        Self::build(ctx, entity, OutcomeKind::AdminDown, String::new())
    }

    pub fn out_of_service(ctx: &RequestContext, entity: E) -> Self {
        Self::build(ctx, entity, OutcomeKind::OutOfService, String::new())
    }

    pub fn exists(ctx: &RequestContext, entity: E) -> Self {
        Self::build(ctx, entity, OutcomeKind::Exists, String::new())
    }

    pub fn can_not_be_removed(ctx: &RequestContext, entity: E) -> Self {
        Self::build(ctx, entity, OutcomeKind::CanNotBeRemoved, String::new())
    }

    pub fn argument_error(ctx: &RequestContext, entity: E, description: impl Into<String>) -> Self {
        Self::build(ctx, entity, OutcomeKind::ArgumentError, description.into())
    }

    pub fn error(ctx: &RequestContext, entity: E, description: impl Into<String>) -> Self {
        Self::build(ctx, entity, OutcomeKind::Error, description.into())
    }

    /// `Error` outcome described by the fault's message
    pub fn error_from(ctx: &RequestContext, entity: E, fault: &dyn std::error::Error) -> Self {
        Self::build(ctx, entity, OutcomeKind::Error, fault.to_string())
    }

    pub fn timeout(ctx: &RequestContext, entity: E, after: Duration) -> Self {
        Self::build(ctx, entity, OutcomeKind::Timeout, timeout_description(after))
            .with_runtime(after)
    }

    pub fn lock_timeout(ctx: &RequestContext, entity: E, after: Duration) -> Self {
        Self::build(
            ctx,
            entity,
            OutcomeKind::LockTimeout,
            lock_timeout_description(after),
        )
        .with_runtime(after)
    }

    pub fn with_warnings<I, S>(mut self, warnings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_runtime(mut self, runtime: Duration) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn entity(&self) -> &E {
        &self.entity
    }

    pub fn kind(&self) -> OutcomeKind {
        self.kind
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn sender(&self) -> &SenderId {
        &self.sender
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    pub fn runtime(&self) -> Option<Duration> {
        self.runtime
    }

    pub fn is_accepted(&self) -> bool {
        self.kind.is_accepted()
    }
}
