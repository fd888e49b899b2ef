//! Result of one command applied to many entities

use std::collections::HashSet;
use std::hash::Hash;
use std::time::Duration;

use serde::Serialize;

use super::entity::EntityOutcome;
use super::kind::OutcomeKind;
use super::text::{
    join_descriptions, lock_timeout_description, normalize_description, timeout_description,
    Warnings,
};
use crate::domain::ids::{CorrelationId, RequestContext, SenderId};
use crate::support::errors::OutcomeError;

/// Outcome of a bulk command.
///
/// `successful` and `rejected` always partition the input entities: every
/// input appears exactly once on one of the two sides. `kind` is the
/// command-level result and may differ from the per-entity kinds, e.g.
/// `LockTimeout` when no entity was processed at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkOutcome<E> {
    kind: OutcomeKind,
    successful: Vec<EntityOutcome<E>>,
    rejected: Vec<EntityOutcome<E>>,
    correlation_id: CorrelationId,
    sender: SenderId,
    description: String,
    warnings: Warnings,
    runtime: Option<Duration>,
}

impl<E> BulkOutcome<E>
where
    E: Clone + Eq + Hash,
{
    /// Build a bulk outcome from already classified entity outcomes.
    ///
    /// The outcomes are not reclassified and must all carry the correlation
    /// id of `ctx`. Description and warnings are
    /// aggregated from the entity outcomes, successful ones first.
    pub fn new(
        ctx: &RequestContext,
        kind: OutcomeKind,
        inputs: &[E],
        successful: Vec<EntityOutcome<E>>,
        rejected: Vec<EntityOutcome<E>>,
    ) -> Result<Self, OutcomeError> {
        if !kind.is_terminal() {
            return Err(OutcomeError::ReservedKind(kind));
        }
        check_partition(inputs, &successful, &rejected)?;
        check_correlation(ctx, &successful, &rejected)?;
        Ok(Self::assemble(ctx, kind, successful, rejected))
    }

    /// Every input processed and accepted.
    pub fn all_successful(ctx: &RequestContext, inputs: &[E]) -> Self {
        let successful = unique(inputs)
            .into_iter()
            .map(|e| EntityOutcome::success(ctx, e))
            .collect();
        Self::assemble(ctx, OutcomeKind::Success, successful, Vec::new())
    }

    /// Nothing to change for any input.
    pub fn no_operation(ctx: &RequestContext, inputs: &[E]) -> Self {
        let successful = unique(inputs)
            .into_iter()
            .map(|e| EntityOutcome::no_operation(ctx, e))
            .collect();
        Self::assemble(ctx, OutcomeKind::NoOperation, successful, Vec::new())
    }

    pub fn admin_down(ctx: &RequestContext, inputs: &[E]) -> Self {
        Self::reject_all(ctx, OutcomeKind::AdminDown, inputs, String::new())
    }

    pub fn argument_error(ctx: &RequestContext, inputs: &[E], description: impl Into<String>) -> Self {
        Self::reject_all(ctx, OutcomeKind::ArgumentError, inputs, description.into())
    }

    pub fn error(ctx: &RequestContext, inputs: &[E], description: impl Into<String>) -> Self {
        Self::reject_all(ctx, OutcomeKind::Error, inputs, description.into())
    }

    pub fn error_from(ctx: &RequestContext, inputs: &[E], fault: &dyn std::error::Error) -> Self {
        Self::reject_all(ctx, OutcomeKind::Error, inputs, fault.to_string())
    }

    pub fn timeout(ctx: &RequestContext, inputs: &[E], after: Duration) -> Self {
        Self::reject_all(ctx, OutcomeKind::Timeout, inputs, timeout_description(after))
            .with_runtime(after)
    }

    /// The command lock was not acquired in time; no input was touched.
    pub fn lock_timeout(ctx: &RequestContext, inputs: &[E], after: Duration) -> Self {
        Self::reject_all(
            ctx,
            OutcomeKind::LockTimeout,
            inputs,
            lock_timeout_description(after),
        )
        .with_runtime(after)
    }

    // Entity outcomes stay undescribed; the message lives once on the bulk.
    fn reject_all(
        ctx: &RequestContext,
        kind: OutcomeKind,
        inputs: &[E],
        description: String,
    ) -> Self {
        let rejected = unique(inputs)
            .into_iter()
            .map(|e| EntityOutcome::build(ctx, e, kind, String::new()))
            .collect();
        Self::assemble(ctx, kind, Vec::new(), rejected).with_description(description)
    }
}

impl<E> BulkOutcome<E> {
    pub(crate) fn assemble(
        ctx: &RequestContext,
        kind: OutcomeKind,
        successful: Vec<EntityOutcome<E>>,
        rejected: Vec<EntityOutcome<E>>,
    ) -> Self {
        let description =
            join_descriptions(successful.iter().chain(&rejected).map(|o| o.description()));
        let mut warnings = Warnings::new();
        for outcome in successful.iter().chain(&rejected) {
            warnings.append(outcome.warnings());
        }
        Self {
            kind,
            successful,
            rejected,
            correlation_id: ctx.correlation_id,
            sender: ctx.sender.clone(),
            description,
            warnings,
            runtime: None,
        }
    }

    pub(crate) fn replace_text(mut self, description: String, warnings: Warnings) -> Self {
        self.description = description;
        self.warnings = warnings;
        self
    }

    /// Put a command-level description line before the aggregated ones.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let command_level = normalize_description(Some(description.into()));
        self.description = join_descriptions([command_level.as_str(), self.description.as_str()]);
        self
    }

    /// Put command-level warnings before the aggregated ones.
    pub fn with_warnings<I, S>(mut self, warnings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut merged: Warnings = warnings.into_iter().collect();
        merged.append(&self.warnings);
        self.warnings = merged;
        self
    }

    pub fn with_runtime(mut self, runtime: Duration) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn kind(&self) -> OutcomeKind {
        self.kind
    }

    pub fn successful(&self) -> &[EntityOutcome<E>] {
        &self.successful
    }

    pub fn rejected(&self) -> &[EntityOutcome<E>] {
        &self.rejected
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

    /// Number of entities covered
    pub fn len(&self) -> usize {
        self.successful.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entity outcomes in partition order, successful first.
    pub fn entity_outcomes(&self) -> impl Iterator<Item = &EntityOutcome<E>> {
        self.successful.iter().chain(&self.rejected)
    }

    /// The per-entity kind, when every entity ended the same way.
    pub fn entity_kind(&self) -> Option<OutcomeKind> {
        let mut kinds = self.entity_outcomes().map(EntityOutcome::kind);
        let first = kinds.next()?;
        kinds.all(|k| k == first).then_some(first)
    }
}

fn unique<E: Clone + Eq + Hash>(inputs: &[E]) -> Vec<E> {
    let mut seen = HashSet::new();
    inputs
        .iter()
        .filter(|e| seen.insert(*e))
        .cloned()
        .collect()
}

fn check_partition<E: Eq + Hash>(
    inputs: &[E],
    successful: &[EntityOutcome<E>],
    rejected: &[EntityOutcome<E>],
) -> Result<(), OutcomeError> {
    let expected: HashSet<&E> = inputs.iter().collect();
    let mut seen = HashSet::new();
    let mut duplicated = 0;
    let mut unexpected = 0;

    for outcome in successful.iter().chain(rejected) {
        let entity = outcome.entity();
        if !expected.contains(entity) {
            unexpected += 1;
        } else if !seen.insert(entity) {
            duplicated += 1;
        }
    }

    let missing = expected.len() - seen.len();
    if missing + duplicated + unexpected > 0 {
        return Err(OutcomeError::PartitionMismatch {
            missing,
            duplicated,
            unexpected,
        });
    }
    Ok(())
}

fn check_correlation<E>(
    ctx: &RequestContext,
    successful: &[EntityOutcome<E>],
    rejected: &[EntityOutcome<E>],
) -> Result<(), OutcomeError> {
    match successful
        .iter()
        .chain(rejected)
        .find(|o| o.correlation_id() != ctx.correlation_id)
    {
        Some(foreign) => Err(OutcomeError::CorrelationMismatch {
            expected: ctx.correlation_id,
            found: foreign.correlation_id(),
        }),
        None => Ok(()),
    }
}
