//! Multi-agent dispatch.
//!
//! Two shapes are supported. `solve_combined` folds every agent into one
//! model, with an independent decision-variable set per agent so that no
//! constraint from one agent can overwrite another's; agents are coupled
//! only through the summed objective, since no market-clearing constraint
//! is defined. `solve_independent` runs one solve per agent on blocking
//! worker tasks, each task owning its agent exclusively for the duration.

use std::sync::Arc;
use std::time::Instant;

use good_lp::{default_solver, Expression, ProblemVariables, ResolutionError, SolverModel};
use indexmap::IndexMap;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::domain::{Agent, FlexRequest};
use crate::error::DispatchError;
use crate::optimizer::milp::{
    apply_dispatch_constraints, apply_schedule, validate_inputs, DispatchVars, MilpDispatcher,
};
use crate::optimizer::{DispatchSchedule, SolveStatus};

/// Flexibility requests keyed by agent id.
pub type FleetFlex = IndexMap<Uuid, FlexRequest>;

/// Solve all agents in one shared model and write every schedule back.
///
/// A single serialized solve: all agents' variables live in one model, so
/// this cannot be parallelized the way independent solves can. Returns the
/// schedules in agent order. On any non-optimal outcome, every agent's
/// status records the failure and no series is modified.
pub fn solve_combined(
    dispatcher: &MilpDispatcher,
    agents: &mut [Agent],
    flex: &FleetFlex,
) -> Result<Vec<DispatchSchedule>, DispatchError> {
    if agents.is_empty() {
        return Err(DispatchError::Configuration("no agents to dispatch".into()));
    }
    for agent in agents.iter() {
        validate_inputs(&agent.series, &agent.params, flex.get(&agent.id)).map_err(|err| {
            match err {
                DispatchError::Configuration(msg) => {
                    DispatchError::Configuration(format!("agent {}: {msg}", agent.name))
                }
                other => other,
            }
        })?;
    }

    let mut problem = ProblemVariables::new();
    let fleet_vars: Vec<DispatchVars> = agents
        .iter()
        .map(|agent| DispatchVars::add_to(&mut problem, agent.series.len(), &agent.params))
        .collect();

    let objective = agents
        .iter()
        .zip(&fleet_vars)
        .map(|(agent, vars)| vars.cost_term(&agent.series))
        .sum::<Expression>();

    let mut model = problem.minimise(objective).using(default_solver);
    for (agent, vars) in agents.iter().zip(&fleet_vars) {
        model = apply_dispatch_constraints(
            model,
            vars,
            &agent.series,
            &agent.params,
            flex.get(&agent.id),
        );
    }

    let started = Instant::now();
    let outcome = model.solve();
    let elapsed = started.elapsed();

    match outcome {
        Ok(solution) => {
            let schedules: Vec<DispatchSchedule> = agents
                .iter()
                .zip(&fleet_vars)
                .map(|(agent, vars)| vars.extract(&solution, &agent.series))
                .collect();
            for (agent, schedule) in agents.iter_mut().zip(&schedules) {
                apply_schedule(agent, schedule);
            }
            tracing::info!(
                agents = agents.len(),
                total_cost = schedules.iter().map(|s| s.cost).sum::<f64>(),
                "combined dispatch optimal"
            );
            Ok(schedules)
        }
        Err(err) => {
            let dispatch_err = match err {
                ResolutionError::Infeasible => DispatchError::Infeasible,
                ResolutionError::Unbounded => DispatchError::Unbounded,
                other => {
                    if elapsed.as_secs() >= dispatcher.time_budget_seconds {
                        DispatchError::Timeout {
                            budget_seconds: dispatcher.time_budget_seconds,
                        }
                    } else {
                        DispatchError::Solver(other.to_string())
                    }
                }
            };
            let status = SolveStatus::from(&dispatch_err);
            for agent in agents.iter_mut() {
                agent.last_status = status;
            }
            tracing::warn!(%status, "combined dispatch failed");
            Err(dispatch_err)
        }
    }
}

/// Solve each agent's model independently, in parallel.
///
/// Agents are moved into blocking worker tasks (one solve is CPU-bound and
/// blocking) and returned in their original order together with each solve
/// outcome. There is no shared mutable state between solves.
pub async fn solve_independent(
    dispatcher: Arc<MilpDispatcher>,
    agents: Vec<Agent>,
    mut flex: FleetFlex,
) -> Vec<(Agent, Result<DispatchSchedule, DispatchError>)> {
    let mut tasks = JoinSet::new();
    let count = agents.len();

    for (index, mut agent) in agents.into_iter().enumerate() {
        let request = flex.shift_remove(&agent.id);
        let dispatcher = Arc::clone(&dispatcher);
        tasks.spawn_blocking(move || {
            let outcome = dispatcher.dispatch_sync(&mut agent, request.as_ref());
            (index, agent, outcome)
        });
    }

    let mut slots: Vec<Option<(Agent, Result<DispatchSchedule, DispatchError>)>> =
        (0..count).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, agent, outcome)) => slots[index] = Some((agent, outcome)),
            Err(join_err) => {
                // A panicked worker loses its agent; surface it loudly.
                tracing::error!(error = %join_err, "dispatch worker task failed");
            }
        }
    }

    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    use crate::domain::{BatteryParams, TimeSeries, TimeStep};

    const EPS: f64 = 1e-6;

    fn agent(name: &str, prices: &[(f64, f64)], dem: f64) -> Agent {
        let steps = prices
            .iter()
            .map(|(mp, fp)| TimeStep::new(*mp, *fp, 0.0, dem))
            .collect();
        let series = TimeSeries::new(NaiveTime::from_hms_opt(0, 0, 0).unwrap(), 60, steps);
        let params = BatteryParams {
            max_buy: 20.0,
            max_sell: 20.0,
            min_dis: 0.0,
            max_dis: 4.0,
            min_char: 0.0,
            max_char: 4.0,
            thres_down: 0.0,
            thres_up: 8.0,
            init_soc: 2.0,
            end_soc: 2.0,
        };
        Agent::new(name, series, params)
    }

    #[test]
    fn combined_solve_matches_per_agent_optima_without_coupling() {
        let prices = [(1.0, 0.8), (4.0, 3.8), (2.0, 1.8)];
        let dispatcher = MilpDispatcher::default();

        let mut solo = agent("solo", &prices, 2.0);
        let solo_schedule = dispatcher
            .dispatch_sync(&mut solo, None)
            .expect("solo feasible");

        let mut fleet = vec![agent("a", &prices, 2.0), agent("b", &prices, 2.0)];
        let schedules =
            solve_combined(&dispatcher, &mut fleet, &FleetFlex::new()).expect("fleet feasible");

        assert_eq!(schedules.len(), 2);
        for schedule in &schedules {
            assert!((schedule.cost - solo_schedule.cost).abs() < EPS);
        }
        for a in &fleet {
            assert_eq!(a.last_status, SolveStatus::Optimal);
        }
    }

    #[test]
    fn one_agents_flex_does_not_leak_into_anothers_schedule() {
        let prices = [(1.0, 0.8), (1.0, 0.8), (1.0, 0.8)];
        let dispatcher = MilpDispatcher::default();

        let mut fleet = vec![agent("flexed", &prices, 2.0), agent("plain", &prices, 2.0)];
        let mut flex = FleetFlex::new();
        let mut request = FlexRequest::new();
        request.force_charge(1, 3.0);
        flex.insert(fleet[0].id, request);

        let schedules = solve_combined(&dispatcher, &mut fleet, &flex).expect("feasible");

        assert!((schedules[0].decisions[1].char - 3.0).abs() < EPS);
        // The un-flexed agent has no reason to charge under flat prices.
        for d in &schedules[1].decisions {
            assert!(d.char.abs() < EPS, "unexpected charge {}", d.char);
        }
    }

    #[test]
    fn combined_solve_rejects_empty_fleet() {
        let dispatcher = MilpDispatcher::default();
        let err = solve_combined(&dispatcher, &mut [], &FleetFlex::new()).unwrap_err();
        assert!(matches!(err, DispatchError::Configuration(_)));
    }

    #[tokio::test]
    async fn independent_solves_preserve_order_and_write_back() {
        let prices = [(1.0, 0.8), (3.0, 2.8)];
        let agents = vec![agent("first", &prices, 1.0), agent("second", &prices, 2.0)];
        let ids: Vec<Uuid> = agents.iter().map(|a| a.id).collect();

        let results = solve_independent(
            Arc::new(MilpDispatcher::default()),
            agents,
            FleetFlex::new(),
        )
        .await;

        assert_eq!(results.len(), 2);
        for ((agent, outcome), expected_id) in results.iter().zip(&ids) {
            assert_eq!(agent.id, *expected_id);
            assert!(outcome.is_ok());
            assert_eq!(agent.last_status, SolveStatus::Optimal);
        }
    }
}
