//! Organization-level metrics
//!
//! Turnover is a pure function of the configured annual rate and the
//! roster's mean satisfaction. It is reported only: nobody leaves a team
//! because of it.

use crate::models::results::MonthlyResult;
use crate::models::roster::TeamRoster;

/// Effective monthly turnover rate
///
/// `annual / 12 * (1.5 - mean_satisfaction / 100)`: half the base monthly
/// rate at full satisfaction, one and a half times it at zero.
///
/// # Example
/// ```
/// use org_simulator_core_rs::orchestrator::metrics::monthly_turnover;
///
/// let rate = monthly_turnover(0.05, 100.0);
/// assert!((rate - 0.05 / 12.0 * 0.5).abs() < 1e-12);
/// ```
pub fn monthly_turnover(annual_rate: f64, mean_satisfaction: f64) -> f64 {
    (annual_rate / 12.0) * (1.5 - mean_satisfaction / 100.0)
}

/// Summarize the roster into one results record
pub fn summarize(
    month: usize,
    roster: &TeamRoster,
    turnover: f64,
    interventions_applied: usize,
) -> MonthlyResult {
    MonthlyResult {
        month,
        turnover,
        performance: roster.mean_of(|t| t.performance()),
        innovation: roster.mean_of(|t| t.innovation()),
        satisfaction: roster.mean_of(|t| t.satisfaction()),
        communication_density: roster.mean_of(|t| t.communication_density()),
        avg_team_size: roster.mean_of(|t| t.size() as f64),
        interventions_applied,
    }
}

/// Record for a completed step
pub fn step_record(
    month: usize,
    roster: &TeamRoster,
    annual_turnover_rate: f64,
    interventions_applied: usize,
) -> MonthlyResult {
    let turnover = monthly_turnover(annual_turnover_rate, roster.mean_of(|t| t.satisfaction()));
    summarize(month, roster, turnover, interventions_applied)
}

/// Month-0 record; no time has elapsed, so turnover is zero
pub fn initial_record(roster: &TeamRoster) -> MonthlyResult {
    summarize(0, roster, 0.0, 0)
}
