use std::path::PathBuf;

use thiserror::Error;

use crate::domain::ids::CorrelationId;
use crate::domain::outcome::OutcomeKind;

/// Rejected attempts to build an outcome that would break its invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutcomeError {
    #[error("Outcome kind '{0}' is reserved for merged outcomes")]
    ReservedKind(OutcomeKind),

    #[error(
        "Bulk outcome does not partition its input: {missing} missing, \
         {duplicated} duplicated, {unexpected} unexpected"
    )]
    PartitionMismatch {
        missing: usize,
        duplicated: usize,
        unexpected: usize,
    },

    #[error("Entity outcome belongs to request {found}, expected {expected}")]
    CorrelationMismatch {
        expected: CorrelationId,
        found: CorrelationId,
    },

    #[error("Unknown outcome kind: {0}")]
    UnknownKind(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Faults raised by a roaming provider client.
///
/// These never reach the merge engine: the fan-out turns them into
/// `Error` outcomes carrying the message.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Provider {0} is not reachable")]
    Unreachable(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Other(String),
}
