//! MILP dispatch for a single agent.
//!
//! The formulation follows the classic battery-dispatch shape: continuous
//! buy/sell/charge/discharge quantities per step, a state-of-charge
//! trajectory of T+1 variables, and binary mode switches gating each
//! continuous quantity. Buying and selling, like charging and discharging,
//! are mutually exclusive within a step.

use std::time::Instant;

use async_trait::async_trait;
use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use itertools::izip;

use crate::domain::{Agent, BatteryParams, FlexDirective, FlexRequest, TimeSeries};
use crate::error::DispatchError;
use crate::optimizer::{DispatchSchedule, DispatchStrategy, SolveStatus, StepDecision};

const EPS: f64 = 1e-6;

/// One agent's decision-variable namespace inside a model.
///
/// Instantiated once per agent so that a combined multi-agent model never
/// shares columns between agents.
pub(crate) struct DispatchVars {
    pub buy: Vec<Variable>,
    pub sell: Vec<Variable>,
    pub char: Vec<Variable>,
    pub dis: Vec<Variable>,
    /// T+1 entries: `soc[0]` is the initial state, `soc[t + 1]` the state
    /// after step `t`. Bounded by the capacity thresholds by construction.
    pub soc: Vec<Variable>,
    pub buy_switch: Vec<Variable>,
    pub sell_switch: Vec<Variable>,
    pub char_switch: Vec<Variable>,
    pub dis_switch: Vec<Variable>,
}

impl DispatchVars {
    pub(crate) fn add_to(
        problem: &mut ProblemVariables,
        horizon: usize,
        params: &BatteryParams,
    ) -> Self {
        Self {
            buy: problem.add_vector(variable().min(0.0), horizon),
            sell: problem.add_vector(variable().min(0.0), horizon),
            char: problem.add_vector(variable().min(0.0), horizon),
            dis: problem.add_vector(variable().min(0.0), horizon),
            soc: problem.add_vector(
                variable().min(params.thres_down).max(params.thres_up),
                horizon + 1,
            ),
            buy_switch: problem.add_vector(variable().binary(), horizon),
            sell_switch: problem.add_vector(variable().binary(), horizon),
            char_switch: problem.add_vector(variable().binary(), horizon),
            dis_switch: problem.add_vector(variable().binary(), horizon),
        }
    }

    /// Objective term for this agent: buy cost minus sell revenue.
    pub(crate) fn cost_term(&self, series: &TimeSeries) -> Expression {
        (0..series.len())
            .map(|t| series.steps[t].mp * self.buy[t] - series.steps[t].fp * self.sell[t])
            .sum::<Expression>()
    }

    /// Read resolved values out of a solution. Switch indicators come back
    /// as relaxed 0/1 floats and are thresholded at one half.
    pub(crate) fn extract(&self, solution: &impl Solution, series: &TimeSeries) -> DispatchSchedule {
        let decisions: Vec<StepDecision> = (0..series.len())
            .map(|t| StepDecision {
                buy: solution.value(self.buy[t]),
                sell: solution.value(self.sell[t]),
                char: solution.value(self.char[t]),
                dis: solution.value(self.dis[t]),
                buy_switch: solution.value(self.buy_switch[t]) > 0.5,
                sell_switch: solution.value(self.sell_switch[t]) > 0.5,
                char_switch: solution.value(self.char_switch[t]) > 0.5,
                dis_switch: solution.value(self.dis_switch[t]) > 0.5,
            })
            .collect();
        let soc: Vec<f64> = self.soc.iter().map(|v| solution.value(*v)).collect();
        let cost = izip!(&decisions, &series.steps)
            .map(|(d, s)| d.buy * s.mp - d.sell * s.fp)
            .sum();
        DispatchSchedule {
            decisions,
            soc,
            cost,
            status: SolveStatus::Optimal,
        }
    }
}

/// Instantiate constraints 1-7 for one agent over its horizon.
pub(crate) fn apply_dispatch_constraints<M: SolverModel>(
    mut model: M,
    vars: &DispatchVars,
    series: &TimeSeries,
    params: &BatteryParams,
    flex: Option<&FlexRequest>,
) -> M {
    // Boundary state of charge.
    model = model.with(constraint!(vars.soc[0] == params.init_soc));
    model = model.with(constraint!(vars.soc[series.len()] == params.end_soc));

    for (t, step) in series.steps.iter().enumerate() {
        // State-of-charge continuity.
        model = model.with(constraint!(
            vars.soc[t + 1] == vars.soc[t] - vars.dis[t] + vars.char[t]
        ));

        // Mutual exclusion of battery modes and of market sides.
        model = model.with(constraint!(vars.dis_switch[t] + vars.char_switch[t] <= 1));
        model = model.with(constraint!(vars.buy_switch[t] + vars.sell_switch[t] <= 1));

        // Charge/discharge magnitude is zero unless the switch is on, and
        // within [min, max] when on.
        model = model.with(constraint!(
            vars.char[t] <= params.max_char * vars.char_switch[t]
        ));
        model = model.with(constraint!(
            vars.char[t] >= params.min_char * vars.char_switch[t]
        ));
        model = model.with(constraint!(
            vars.dis[t] <= params.max_dis * vars.dis_switch[t]
        ));
        model = model.with(constraint!(
            vars.dis[t] >= params.min_dis * vars.dis_switch[t]
        ));

        // Market bounds.
        model = model.with(constraint!(
            vars.buy[t] <= params.max_buy * vars.buy_switch[t]
        ));
        model = model.with(constraint!(
            vars.sell[t] <= params.max_sell * vars.sell_switch[t]
        ));

        // Power balance: buy + pv + dis == sell + dem + char.
        model = model.with(constraint!(
            vars.buy[t] + vars.dis[t] - vars.sell[t] - vars.char[t] == step.dem - step.pv
        ));
    }

    // Flexibility overlay: force charge/discharge at the requested steps.
    if let Some(request) = flex {
        for (t, directive) in request.iter() {
            model = match directive {
                FlexDirective::Up(v) => model.with(constraint!(vars.char[t] == v)),
                FlexDirective::Down(v) => model.with(constraint!(vars.dis[t] == v)),
            };
        }
    }

    model
}

pub(crate) fn validate_inputs(
    series: &TimeSeries,
    params: &BatteryParams,
    flex: Option<&FlexRequest>,
) -> Result<(), DispatchError> {
    series.validate()?;
    params.validate()?;
    if let Some(request) = flex {
        request.validate(series.len())?;
    }
    Ok(())
}

/// Write an optimal schedule back into the agent's series and accumulate
/// its cost. Discharge and sell values are sign-flipped to represent
/// outflows.
pub fn apply_schedule(agent: &mut Agent, schedule: &DispatchSchedule) {
    for (step, decision, soc_after) in izip!(
        agent.series.steps.iter_mut(),
        &schedule.decisions,
        schedule.soc.iter().skip(1)
    ) {
        step.buy = decision.buy;
        step.sell = -decision.sell;
        step.cap = *soc_after;
        step.char = decision.char;
        step.dis = -decision.dis;
        step.buy_switch = decision.buy_switch;
        step.sell_switch = decision.sell_switch;
        step.char_switch = decision.char_switch;
        step.dis_switch = decision.dis_switch;
    }
    agent.accumulated_cost += schedule.cost;
    agent.last_status = schedule.status;
}

/// Single-agent MILP dispatcher on the crate's default LP solver (CBC).
pub struct MilpDispatcher {
    /// Wall-clock budget for one solve. good_lp does not expose solver
    /// time limits portably, so the budget is enforced around the blocking
    /// solve call: a failure past the budget is reported as a timeout,
    /// distinct from infeasibility.
    pub time_budget_seconds: u64,
}

impl Default for MilpDispatcher {
    fn default() -> Self {
        Self {
            time_budget_seconds: 30,
        }
    }
}

impl MilpDispatcher {
    pub fn new(time_budget_seconds: u64) -> Self {
        Self {
            time_budget_seconds,
        }
    }

    /// Solve one horizon without touching any agent state.
    pub fn solve(
        &self,
        series: &TimeSeries,
        params: &BatteryParams,
        flex: Option<&FlexRequest>,
    ) -> Result<DispatchSchedule, DispatchError> {
        validate_inputs(series, params, flex)?;

        let mut problem = ProblemVariables::new();
        let vars = DispatchVars::add_to(&mut problem, series.len(), params);
        let objective = vars.cost_term(series);

        let model = problem.minimise(objective).using(default_solver);
        let model = apply_dispatch_constraints(model, &vars, series, params, flex);

        let started = Instant::now();
        let outcome = model.solve();
        let elapsed = started.elapsed();

        match outcome {
            Ok(solution) => {
                if elapsed.as_secs() >= self.time_budget_seconds {
                    tracing::warn!(
                        elapsed_s = elapsed.as_secs_f64(),
                        budget_s = self.time_budget_seconds,
                        "solve finished past its budget"
                    );
                }
                Ok(vars.extract(&solution, series))
            }
            Err(ResolutionError::Infeasible) => Err(DispatchError::Infeasible),
            Err(ResolutionError::Unbounded) => Err(DispatchError::Unbounded),
            Err(other) => {
                if elapsed.as_secs() >= self.time_budget_seconds {
                    Err(DispatchError::Timeout {
                        budget_seconds: self.time_budget_seconds,
                    })
                } else {
                    Err(DispatchError::Solver(other.to_string()))
                }
            }
        }
    }

    /// Solve and write back, recording the outcome status on the agent
    /// either way.
    pub fn dispatch_sync(
        &self,
        agent: &mut Agent,
        flex: Option<&FlexRequest>,
    ) -> Result<DispatchSchedule, DispatchError> {
        match self.solve(&agent.series, &agent.params, flex) {
            Ok(schedule) => {
                apply_schedule(agent, &schedule);
                tracing::debug!(
                    agent = %agent.name,
                    cost = schedule.cost,
                    "dispatch optimal"
                );
                Ok(schedule)
            }
            Err(err) => {
                agent.last_status = SolveStatus::from(&err);
                tracing::warn!(agent = %agent.name, status = %agent.last_status, error = %err, "dispatch failed");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl DispatchStrategy for MilpDispatcher {
    async fn dispatch(
        &self,
        agent: &mut Agent,
        flex: Option<&FlexRequest>,
    ) -> Result<DispatchSchedule, DispatchError> {
        self.dispatch_sync(agent, flex)
    }
}
