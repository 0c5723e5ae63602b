use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Agent, FlexRequest};
use crate::error::DispatchError;

/// Outcome of a solve attempt.
///
/// Only `Optimal` carries a meaningful objective value; every other status
/// is recorded on the agent and propagated to the caller rather than
/// silently treated as success.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SolveStatus {
    NotSolved,
    Optimal,
    Infeasible,
    Unbounded,
    TimedOut,
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStatus::NotSolved => write!(f, "not_solved"),
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::Unbounded => write!(f, "unbounded"),
            SolveStatus::TimedOut => write!(f, "timed_out"),
        }
    }
}

impl From<&DispatchError> for SolveStatus {
    fn from(err: &DispatchError) -> Self {
        match err {
            DispatchError::Infeasible => SolveStatus::Infeasible,
            DispatchError::Unbounded => SolveStatus::Unbounded,
            DispatchError::Timeout { .. } => SolveStatus::TimedOut,
            DispatchError::Configuration(_) | DispatchError::Solver(_) => SolveStatus::NotSolved,
        }
    }
}

/// Resolved decisions for one step. Magnitudes are non-negative here; the
/// sign convention for outflows is applied when writing back into the
/// agent's series.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StepDecision {
    pub buy: f64,
    pub sell: f64,
    pub char: f64,
    pub dis: f64,
    pub buy_switch: bool,
    pub sell_switch: bool,
    pub char_switch: bool,
    pub dis_switch: bool,
}

/// Cost-minimal schedule for one agent's horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchSchedule {
    pub decisions: Vec<StepDecision>,
    /// State-of-charge trajectory with T+1 entries: `soc[0]` is the initial
    /// state, `soc[t + 1]` the state after step `t`.
    pub soc: Vec<f64>,
    /// Objective value: total buy cost minus sell revenue.
    pub cost: f64,
    pub status: SolveStatus,
}

/// Seam between schedule consumers and the concrete solver backend.
#[async_trait]
pub trait DispatchStrategy: Send + Sync {
    /// Solve one agent's horizon and write the result back into the agent.
    ///
    /// The call holds exclusive logical ownership of the agent's state for
    /// its duration; the agent's status always reflects the outcome.
    async fn dispatch(
        &self,
        agent: &mut Agent,
        flex: Option<&FlexRequest>,
    ) -> Result<DispatchSchedule, DispatchError>;
}
