//! Command outcomes
//!
//! - [`OutcomeKind`]: the closed outcome vocabulary
//! - [`EntityOutcome`]: one command, one entity
//! - [`BulkOutcome`]: one command, many entities, partitioned into
//!   successful and rejected
//! - [`DestinationOutcome`]: one command pushed to one remote destination
//!
//! Outcomes are immutable values. Combining several of them is done by
//! [`crate::application::merge`].

pub mod bulk;
pub mod destination;
pub mod entity;
pub mod kind;
pub mod text;

pub use bulk::BulkOutcome;
pub use destination::{DestinationOutcome, DestinationSummary};
pub use entity::EntityOutcome;
pub use kind::OutcomeKind;
pub use text::Warnings;
