//! Growth stage resolution.
//!
//! A session grows through a fixed number of stages. Each configured
//! milestone is a clock text (`"3:50"`) at which the next stage is reached;
//! the n-th milestone leads to stage n+1.

use serde::{Deserialize, Serialize};

use super::clock::{format_clock, parse_clock};
use crate::error::ConfigError;

/// Highest stage a session can reach.
pub const MAX_STAGE: u8 = 3;

/// Default milestone texts against a five-minute countdown.
pub const DEFAULT_MILESTONES: [&str; 3] = ["3:50", "2:00", "0:30"];

/// Ordered milestone set plus the stage ceiling.
///
/// Thresholds are held in canonical clock rendering so they can be compared
/// to tick output by plain string equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthMilestones {
    thresholds: Vec<String>,
    ceiling: u8,
}

impl Default for GrowthMilestones {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_MILESTONES.iter().map(|t| t.to_string()).collect(),
            ceiling: MAX_STAGE,
        }
    }
}

impl GrowthMilestones {
    /// Build a milestone set, canonicalising every threshold.
    ///
    /// Thresholds are put in countdown order (most time remaining first) and
    /// duplicates are dropped, so the n-th milestone the clock passes always
    /// leads to stage n+1 whatever order they were configured in.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a threshold is not valid clock
    /// text.
    pub fn new<I, T>(thresholds: I, ceiling: u8) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut remaining = thresholds
            .into_iter()
            .map(|raw| {
                let raw = raw.as_ref();
                parse_clock(raw).ok_or_else(|| ConfigError::InvalidValue {
                    key: "session.milestones".into(),
                    message: format!("'{raw}' is not m:ss clock text"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        remaining.sort_unstable_by(|a, b| b.cmp(a));
        remaining.dedup();
        Ok(Self {
            thresholds: remaining.into_iter().map(format_clock).collect(),
            ceiling,
        })
    }

    pub fn thresholds(&self) -> &[String] {
        &self.thresholds
    }

    pub fn ceiling(&self) -> u8 {
        self.ceiling
    }

    /// Stage that follows `current` for a tick rendered as `clock_text`.
    ///
    /// Advances by exactly one when the text matches a milestone whose
    /// target stage lies beyond `current` and the ceiling is not reached.
    /// Feeding the returned stage back in with the same text is a no-op.
    pub fn resolve(&self, clock_text: &str, current: u8) -> u8 {
        if current >= self.ceiling {
            return current;
        }
        match self.thresholds.iter().position(|t| t == clock_text) {
            Some(index) if index + 1 > usize::from(current) => current + 1,
            _ => current,
        }
    }
}
