//! # Roaming outcomes
//!
//! Command outcomes for an e-mobility roaming network: charging station
//! operators, pools, stations and EVSEs on one side, roaming providers on
//! the other.
//!
//! ## Architecture
//!
//! - **domain**: identifiers and the outcome model (`OutcomeKind`,
//!   `EntityOutcome`, `BulkOutcome`, `DestinationOutcome`)
//! - **application**: merging outcomes, bulk command execution and the
//!   concurrent push to roaming providers
//! - **support**: errors, cancellation, tracing setup
//! - **config**: TOML configuration

pub mod application;
pub mod config;
pub mod domain;
pub mod support;

pub use config::{config_path_from_env, default_config_path, AppConfig};

pub use application::roaming::{
    FanOutPusher, PushClient, PushItems, RoamingProviderRegistry, StatusPush,
    StatusPushOutcome,
};
pub use application::{merge_bulk, merge_destinations, BulkExecutor};
pub use domain::{
    BulkOutcome, CorrelationId, DestinationOutcome, EntityOutcome, OutcomeKind, RequestContext,
};
pub use support::cancel::CancelSignal;
pub use support::errors::{ConfigError, OutcomeError, ProviderError};
pub use support::logging::init_tracing;
