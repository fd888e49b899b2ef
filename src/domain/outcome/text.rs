//! Description and warning normalization
//!
//! Both are normalized once, when an outcome is built. Nothing downstream
//! re-filters or re-trims.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Separator used when joining descriptions of several outcomes.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Trim a description; a missing one becomes the empty string.
pub fn normalize_description<S: AsRef<str>>(description: Option<S>) -> String {
    description
        .as_ref()
        .map(|d| d.as_ref().trim().to_string())
        .unwrap_or_default()
}

/// Join descriptions in the given order, skipping empty ones.
pub fn join_descriptions<'a, I>(descriptions: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    descriptions
        .into_iter()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR)
}

/// Whole seconds print without decimals, fractions with at most three.
pub fn format_seconds(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        return duration.as_secs().to_string();
    }
    let formatted = format!("{:.3}", duration.as_secs_f64());
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

pub fn timeout_description(after: Duration) -> String {
    format!("Timeout after {} seconds!", format_seconds(after))
}

pub fn lock_timeout_description(after: Duration) -> String {
    format!(
        "Could not acquire the lock within {} seconds!",
        format_seconds(after)
    )
}

/// Ordered list of warnings with blank entries dropped on insertion.
/// Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Warnings(Vec<String>);

impl Warnings {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        if !warning.trim().is_empty() {
            self.0.push(warning);
        }
    }

    /// Append another list, keeping its order.
    pub fn append(&mut self, other: &Warnings) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<S: Into<String>> FromIterator<S> for Warnings {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut warnings = Warnings::new();
        for warning in iter {
            warnings.push(warning);
        }
        warnings
    }
}

impl<S: Into<String>> Extend<S> for Warnings {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for warning in iter {
            self.push(warning);
        }
    }
}
