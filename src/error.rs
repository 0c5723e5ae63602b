use thiserror::Error;

/// Dispatch-level errors.
///
/// Configuration problems are caught before any model is built; the
/// remaining variants classify what the solver reported. An infeasible or
/// unbounded solve has no meaningful objective value and is never folded
/// into an agent's running cost.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no feasible schedule exists for the given inputs")]
    Infeasible,

    #[error("objective has no finite minimum (constraint-authoring defect)")]
    Unbounded,

    #[error("solve exceeded the {budget_seconds}s budget without a definitive status")]
    Timeout { budget_seconds: u64 },

    #[error("solver failure: {0}")]
    Solver(String),
}
