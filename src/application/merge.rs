//! Merging outcomes of one command executed by several destinations
//!
//! The rule is the same for every outcome shape:
//!
//! ```text
//! all inputs share one kind  ──► that kind
//! any disagreement           ──► Partial   (no majority, no severity tie-break)
//! no input at all            ──► Error "!"
//! ```
//!
//! Descriptions, warnings and rejected items are concatenated in input
//! order, never deduplicated. The aggregate runtime is whatever the caller
//! measured for the whole fan-out. Inputs are only read; the result is a
//! new value and identical inputs always give an identical result.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::ids::{CorrelationId, RequestContext};
use crate::domain::outcome::text::{join_descriptions, Warnings};
use crate::domain::outcome::{
    BulkOutcome, DestinationOutcome, DestinationSummary, EntityOutcome, OutcomeKind,
};

/// Description of the outcome returned for an empty merge
pub const EMPTY_MERGE_DESCRIPTION: &str = "!";

/// Aggregate kind of a set of kinds; `None` when there are none.
pub fn aggregate_kind<I>(kinds: I) -> Option<OutcomeKind>
where
    I: IntoIterator<Item = OutcomeKind>,
{
    let mut buckets: BTreeMap<OutcomeKind, usize> = BTreeMap::new();
    for kind in kinds {
        *buckets.entry(kind).or_default() += 1;
    }

    match buckets.len() {
        0 => None,
        1 => buckets.keys().next().copied(),
        _ => {
            debug!(?buckets, "Destinations disagree, aggregate is partial");
            Some(OutcomeKind::Partial)
        }
    }
}

/// Merge destination outcomes into one.
///
/// The aggregate is attributed to the first input's destination and keeps
/// a per-destination breakdown. Callers holding an optional collection can
/// pass `maybe.into_iter().flatten()`.
pub fn merge_destinations<'a, D, T, I>(
    ctx: &RequestContext,
    outcomes: I,
    runtime: Duration,
) -> DestinationOutcome<D, T>
where
    D: Clone + 'a,
    T: Clone + 'a,
    I: IntoIterator<Item = &'a DestinationOutcome<D, T>>,
{
    let outcomes: Vec<&DestinationOutcome<D, T>> = outcomes.into_iter().collect();

    let Some(kind) = aggregate_kind(outcomes.iter().map(|o| o.kind())) else {
        warn!(
            correlation_id = %ctx.correlation_id,
            "Nothing to merge, returning error sentinel"
        );
        return DestinationOutcome::nothing_to_merge(ctx).with_runtime(runtime);
    };

    warn_on_foreign_correlation(ctx, outcomes.iter().map(|o| o.correlation_id()));

    let description = join_descriptions(outcomes.iter().map(|o| o.description()));
    let mut warnings = Warnings::new();
    let mut rejected_items = Vec::new();
    let mut breakdown = Vec::with_capacity(outcomes.len());
    for outcome in &outcomes {
        warnings.append(outcome.warnings());
        rejected_items.extend(outcome.rejected_items().iter().cloned());
        breakdown.push(outcome.summary());
    }

    let origin = outcomes[0].destination().cloned();
    DestinationOutcome::aggregate(
        ctx,
        origin,
        kind,
        description,
        rejected_items,
        warnings,
        breakdown,
    )
    .with_runtime(runtime)
}

/// Merge bulk outcomes of the same command run against redundant back-ends.
///
/// An entity ends up rejected when any back-end rejected it (the first
/// rejection is kept), otherwise successful (the first success is kept).
/// Entities are listed in order of first appearance, so the result still
/// partitions the union of the inputs.
pub fn merge_bulk<'a, E, I>(ctx: &RequestContext, outcomes: I, runtime: Duration) -> BulkOutcome<E>
where
    E: Clone + Eq + Hash + 'a,
    I: IntoIterator<Item = &'a BulkOutcome<E>>,
{
    let outcomes: Vec<&BulkOutcome<E>> = outcomes.into_iter().collect();

    let Some(kind) = aggregate_kind(outcomes.iter().map(|o| o.kind())) else {
        warn!(
            correlation_id = %ctx.correlation_id,
            "Nothing to merge, returning error sentinel"
        );
        return BulkOutcome::error(ctx, &[], EMPTY_MERGE_DESCRIPTION).with_runtime(runtime);
    };

    warn_on_foreign_correlation(ctx, outcomes.iter().map(|o| o.correlation_id()));

    let mut order: Vec<&E> = Vec::new();
    let mut verdicts: HashMap<&E, Verdict<'_, E>> = HashMap::new();
    for outcome in &outcomes {
        for entity_outcome in outcome.successful() {
            let verdict = verdicts.entry(entity_outcome.entity()).or_insert_with(|| {
                order.push(entity_outcome.entity());
                Verdict::default()
            });
            verdict.accepted.get_or_insert(entity_outcome);
        }
        for entity_outcome in outcome.rejected() {
            let verdict = verdicts.entry(entity_outcome.entity()).or_insert_with(|| {
                order.push(entity_outcome.entity());
                Verdict::default()
            });
            verdict.rejected.get_or_insert(entity_outcome);
        }
    }

    let mut successful = Vec::new();
    let mut rejected = Vec::new();
    for entity in order {
        match verdicts.get(entity) {
            Some(Verdict {
                rejected: Some(first_rejection),
                ..
            }) => rejected.push((*first_rejection).clone()),
            Some(Verdict {
                accepted: Some(first_success),
                ..
            }) => successful.push((*first_success).clone()),
            _ => {}
        }
    }

    let description = join_descriptions(outcomes.iter().map(|o| o.description()));
    let mut warnings = Warnings::new();
    for outcome in &outcomes {
        warnings.append(outcome.warnings());
    }

    BulkOutcome::assemble(ctx, kind, successful, rejected)
        .replace_text(description, warnings)
        .with_runtime(runtime)
}

struct Verdict<'a, E> {
    accepted: Option<&'a EntityOutcome<E>>,
    rejected: Option<&'a EntityOutcome<E>>,
}

impl<E> Default for Verdict<'_, E> {
    fn default() -> Self {
        Self {
            accepted: None,
            rejected: None,
        }
    }
}

fn warn_on_foreign_correlation<I>(ctx: &RequestContext, ids: I)
where
    I: IntoIterator<Item = CorrelationId>,
{
    let foreign = ids
        .into_iter()
        .filter(|id| *id != ctx.correlation_id)
        .count();
    if foreign > 0 {
        warn!(
            correlation_id = %ctx.correlation_id,
            foreign,
            "Merging outcomes that belong to another request"
        );
    }
}

/// Per-destination answers whose kind differs from the first
/// destination's.
///
/// The first destination is the baseline, not the majority: for
/// `[Error, Success, Success]` the two successes are returned. Use
/// [`DestinationOutcome::by_kind`] to see every group.
pub fn disagreeing<D: Clone, T>(outcome: &DestinationOutcome<D, T>) -> Vec<&DestinationSummary<D>> {
    match outcome.breakdown().first() {
        Some(first) => outcome.dissenters(first.kind),
        None => Vec::new(),
    }
}
