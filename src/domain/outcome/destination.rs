//! Result of pushing one command to one external destination

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use super::kind::OutcomeKind;
use super::text::{lock_timeout_description, normalize_description, timeout_description, Warnings};
use crate::domain::ids::{CorrelationId, RequestContext};
use crate::support::errors::OutcomeError;

/// How one destination answered, kept on merged outcomes so a `Partial`
/// result still tells who disagreed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationSummary<D> {
    pub destination: Option<D>,
    pub kind: OutcomeKind,
    pub description: String,
}

/// Outcome of a push to one destination (usually a roaming provider).
///
/// `D` names the destination, `T` is the command-specific item a
/// destination can reject (e.g. a single status update of a batch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationOutcome<D, T> {
    destination: Option<D>,
    kind: OutcomeKind,
    correlation_id: CorrelationId,
    description: String,
    rejected_items: Vec<T>,
    warnings: Warnings,
    runtime: Option<Duration>,
    breakdown: Vec<DestinationSummary<D>>,
}

impl<D, T> DestinationOutcome<D, T> {
    /// Build an outcome of any terminal kind.
    ///
    /// Fails with [`OutcomeError::ReservedKind`] for `Partial`.
    pub fn new(
        ctx: &RequestContext,
        destination: D,
        kind: OutcomeKind,
        description: impl Into<String>,
    ) -> Result<Self, OutcomeError> {
        if !kind.is_terminal() {
            return Err(OutcomeError::ReservedKind(kind));
        }
        Ok(Self::build(ctx, Some(destination), kind, description.into()))
    }

    fn build(
        ctx: &RequestContext,
        destination: Option<D>,
        kind: OutcomeKind,
        description: String,
    ) -> Self {
        Self {
            destination,
            kind,
            correlation_id: ctx.correlation_id,
            description: normalize_description(Some(description)),
            rejected_items: Vec::new(),
            warnings: Warnings::new(),
            runtime: None,
            breakdown: Vec::new(),
        }
    }

    /// Merged outcome; text is taken as already normalized.
    pub(crate) fn aggregate(
        ctx: &RequestContext,
        destination: Option<D>,
        kind: OutcomeKind,
        description: String,
        rejected_items: Vec<T>,
        warnings: Warnings,
        breakdown: Vec<DestinationSummary<D>>,
    ) -> Self {
        Self {
            destination,
            kind,
            correlation_id: ctx.correlation_id,
            description,
            rejected_items,
            warnings,
            runtime: None,
            breakdown,
        }
    }

    pub fn success(ctx: &RequestContext, destination: D) -> Self {
        Self::build(ctx, Some(destination), OutcomeKind::Success, String::new())
    }

    pub fn no_operation(ctx: &RequestContext, destination: D) -> Self {
        Self::build(ctx, Some(destination), OutcomeKind::NoOperation, String::new())
    }

    pub fn enqueued(ctx: &RequestContext, destination: D) -> Self {
        Self::build(ctx, Some(destination), OutcomeKind::Enqueued, String::new())
    }

    pub fn admin_down(ctx: &RequestContext, destination: D) -> Self {
        Self::build(ctx, Some(destination), OutcomeKind::AdminDown, String::new())
    }

    pub fn out_of_service(ctx: &RequestContext, destination: D) -> Self {
        Self::build(ctx, Some(destination), OutcomeKind::OutOfService, String::new())
    }

    pub fn argument_error(ctx: &RequestContext, destination: D, description: impl Into<String>) -> Self {
        Self::build(ctx, Some(destination), OutcomeKind::ArgumentError, description.into())
    }

    pub fn error(ctx: &RequestContext, destination: D, description: impl Into<String>) -> Self {
        Self::build(ctx, Some(destination), OutcomeKind::Error, description.into())
    }

    pub fn error_from(ctx: &RequestContext, destination: D, fault: &dyn std::error::Error) -> Self {
        Self::build(ctx, Some(destination), OutcomeKind::Error, fault.to_string())
    }

    pub fn timeout(ctx: &RequestContext, destination: D, after: Duration) -> Self {
        Self::build(
            ctx,
            Some(destination),
            OutcomeKind::Timeout,
            timeout_description(after),
        )
        .with_runtime(after)
    }

    pub fn lock_timeout(ctx: &RequestContext, destination: D, after: Duration) -> Self {
        Self::build(
            ctx,
            Some(destination),
            OutcomeKind::LockTimeout,
            lock_timeout_description(after),
        )
        .with_runtime(after)
    }

    /// Sentinel returned when there was nothing to merge.
    pub(crate) fn nothing_to_merge(ctx: &RequestContext) -> Self {
        Self::build(ctx, None, OutcomeKind::Error, "!".to_string())
    }

    pub fn with_rejected_items(mut self, items: impl IntoIterator<Item = T>) -> Self {
        self.rejected_items.extend(items);
        self
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

    /// `None` only for the empty-merge sentinel.
    pub fn destination(&self) -> Option<&D> {
        self.destination.as_ref()
    }

    pub fn kind(&self) -> OutcomeKind {
        self.kind
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn rejected_items(&self) -> &[T] {
        &self.rejected_items
    }

    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    pub fn runtime(&self) -> Option<Duration> {
        self.runtime
    }

    /// Per-destination answers behind a merged outcome, in merge order.
    /// Empty for outcomes reported by a single destination.
    pub fn breakdown(&self) -> &[DestinationSummary<D>] {
        &self.breakdown
    }

    /// Breakdown grouped by kind, kinds in severity order and destinations
    /// in merge order within each kind.
    pub fn by_kind(&self) -> BTreeMap<OutcomeKind, Vec<&DestinationSummary<D>>> {
        let mut groups: BTreeMap<OutcomeKind, Vec<&DestinationSummary<D>>> = BTreeMap::new();
        for summary in &self.breakdown {
            groups.entry(summary.kind).or_default().push(summary);
        }
        groups
    }
}

impl<D: Clone, T> DestinationOutcome<D, T> {
    pub fn summary(&self) -> DestinationSummary<D> {
        DestinationSummary {
            destination: self.destination.clone(),
            kind: self.kind,
            description: self.description.clone(),
        }
    }

    /// Destinations whose answer differs from `kind`.
    pub fn dissenters(&self, kind: OutcomeKind) -> Vec<&DestinationSummary<D>> {
        self.breakdown.iter().filter(|s| s.kind != kind).collect()
    }
}
