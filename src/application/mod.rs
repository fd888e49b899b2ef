pub mod bulk;
pub mod merge;
pub mod roaming;

pub use bulk::BulkExecutor;
pub use merge::{aggregate_kind, disagreeing, merge_bulk, merge_destinations};
