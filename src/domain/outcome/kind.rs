//! Outcome vocabulary shared by every command result

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::support::errors::OutcomeError;

/// Closed set of command outcomes.
///
/// Variants are declared in severity order; [`OutcomeKind::severity`]
/// exposes the ordinal. Aggregation never uses it to pick a winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Unspecified,
    /// Target is administratively disabled
    AdminDown,
    /// Command was valid but changed nothing
    NoOperation,
    /// Accepted for later processing
    Enqueued,
    Success,
    OutOfService,
    /// Destinations disagreed. Only produced by the merge engine.
    Partial,
    ArgumentError,
    Exists,
    CanNotBeRemoved,
    Error,
    Timeout,
    LockTimeout,
}

impl OutcomeKind {
    pub const ALL: [OutcomeKind; 13] = [
        Self::Unspecified,
        Self::AdminDown,
        Self::NoOperation,
        Self::Enqueued,
        Self::Success,
        Self::OutOfService,
        Self::Partial,
        Self::ArgumentError,
        Self::Exists,
        Self::CanNotBeRemoved,
        Self::Error,
        Self::Timeout,
        Self::LockTimeout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::AdminDown => "admin_down",
            Self::NoOperation => "no_operation",
            Self::Enqueued => "enqueued",
            Self::Success => "success",
            Self::OutOfService => "out_of_service",
            Self::Partial => "partial",
            Self::ArgumentError => "argument_error",
            Self::Exists => "exists",
            Self::CanNotBeRemoved => "can_not_be_removed",
            Self::Error => "error",
            Self::Timeout => "timeout",
            Self::LockTimeout => "lock_timeout",
        }
    }

    /// Position in the severity order, `Unspecified` being 0.
    pub fn severity(&self) -> u8 {
        *self as u8
    }

    /// Whether an entity with this outcome belongs to the successful side
    /// of a bulk result.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Success | Self::NoOperation | Self::Enqueued)
    }

    /// Whether a leaf operation may report this kind.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Partial)
    }

    /// Time budget exhaustion, either waiting for a reply or for a lock.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout | Self::LockTimeout)
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutcomeKind {
    type Err = OutcomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| OutcomeError::UnknownKind(s.to_string()))
    }
}
