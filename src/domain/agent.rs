use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BatteryParams, TimeSeries};
use crate::optimizer::SolveStatus;

/// One EMS stakeholder: a battery, generation and demand forecast, and the
/// running cost it has accumulated across dispatch rounds.
///
/// Created once per simulation run and mutated in place by each solve; the
/// time series is the only state that outlives a single solve call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: Uuid,
    pub name: String,
    pub series: TimeSeries,
    pub params: BatteryParams,
    /// Sum of objective values of every optimal solve so far. Non-optimal
    /// solves contribute nothing.
    pub accumulated_cost: f64,
    pub last_status: SolveStatus,
}

impl Agent {
    pub fn new(name: impl Into<String>, series: TimeSeries, params: BatteryParams) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            series,
            params,
            accumulated_cost: 0.0,
            last_status: SolveStatus::NotSolved,
        }
    }
}
