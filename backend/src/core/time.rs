//! Month clock for the simulation
//!
//! The simulation operates in discrete monthly steps. Month 0 is the state
//! produced by initialization; every completed step advances one month.
//! The planned duration is advisory: the engine never stops on its own.

use serde::{Deserialize, Serialize};

/// Tracks the current simulation month against the planned duration
///
/// # Example
/// ```
/// use org_simulator_core_rs::MonthClock;
///
/// let mut clock = MonthClock::new(12);
/// assert_eq!(clock.current_month(), 0);
///
/// clock.advance_month();
/// assert_eq!(clock.current_month(), 1);
/// assert_eq!(clock.remaining_planned_months(), 11);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthClock {
    /// Completed steps since initialization
    current_month: usize,
    /// Planned number of months (advisory)
    planned_duration: usize,
}

impl MonthClock {
    /// Create a clock at month 0
    pub fn new(planned_duration: usize) -> Self {
        Self {
            current_month: 0,
            planned_duration,
        }
    }

    /// Rebuild a clock at a given month (checkpoint restore)
    pub fn from_state(current_month: usize, planned_duration: usize) -> Self {
        Self {
            current_month,
            planned_duration,
        }
    }

    /// Advance by one month and return the new month number
    pub fn advance_month(&mut self) -> usize {
        self.current_month += 1;
        self.current_month
    }

    /// Get the current month (number of completed steps)
    pub fn current_month(&self) -> usize {
        self.current_month
    }

    /// Get the planned duration in months
    pub fn planned_duration(&self) -> usize {
        self.planned_duration
    }

    /// Months left before the planned duration is reached (0 once past it)
    pub fn remaining_planned_months(&self) -> usize {
        self.planned_duration.saturating_sub(self.current_month)
    }

    /// Whether the simulation has run beyond its planned duration
    pub fn is_past_planned_duration(&self) -> bool {
        self.current_month > self.planned_duration
    }
}
