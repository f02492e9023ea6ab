//! Results series
//!
//! One summary record per month: month 0 comes from initialization, every
//! completed step appends the next. The series is append-only and is the
//! sole source for dashboards and reports.

use serde::{Deserialize, Serialize};

/// Organization-wide summary for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyResult {
    pub month: usize,
    /// Effective monthly turnover rate (fraction of headcount)
    pub turnover: f64,
    pub performance: f64,
    pub innovation: f64,
    pub satisfaction: f64,
    pub communication_density: f64,
    pub avg_team_size: f64,
    /// Interventions that fired during this month
    #[serde(rename = "interventions")]
    pub interventions_applied: usize,
}

/// Append-only sequence of monthly results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultsSeries {
    records: Vec<MonthlyResult>,
}

impl ResultsSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: MonthlyResult) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[MonthlyResult] {
        &self.records
    }

    pub fn latest(&self) -> Option<&MonthlyResult> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when months run 0, 1, 2, ... without gaps
    pub fn is_contiguous(&self) -> bool {
        self.records.iter().enumerate().all(|(i, r)| r.month == i)
    }
}
