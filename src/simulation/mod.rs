//! Market-operator round loop.
//!
//! Each round the operator draws flexibility requests for a random subset
//! of agents, dispatches the whole fleet (independent parallel solves, one
//! per agent) and records the per-agent outcome. Agents persist across
//! rounds and keep accumulating cost.

pub mod scenario;

use std::sync::Arc;

use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Agent, FlexRequest};
use crate::optimizer::{fleet, FleetFlex, MilpDispatcher, SolveStatus};

/// Outcome of one agent in one round.
#[derive(Debug, Clone, Serialize)]
pub struct RoundReport {
    pub round: usize,
    pub agent_id: Uuid,
    pub agent_name: String,
    pub status: SolveStatus,
    /// Objective value of this round's solve; absent when non-optimal.
    pub cost: Option<f64>,
    pub flexed: bool,
}

pub struct MarketSimulation {
    agents: Vec<Agent>,
    dispatcher: Arc<MilpDispatcher>,
    rounds: usize,
    flex_probability: f64,
    rng: StdRng,
}

impl MarketSimulation {
    pub fn new(
        agents: Vec<Agent>,
        dispatcher: MilpDispatcher,
        rounds: usize,
        flex_probability: f64,
        seed: u64,
    ) -> Self {
        Self {
            agents,
            dispatcher: Arc::new(dispatcher),
            rounds,
            flex_probability,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Run all rounds, returning one report per (round, agent).
    pub async fn run(&mut self) -> Vec<RoundReport> {
        let mut reports = Vec::with_capacity(self.rounds * self.agents.len());

        for round in 0..self.rounds {
            let flex = self.draw_flex();
            let flexed: Vec<Uuid> = flex.keys().copied().collect();
            tracing::info!(round, requests = flexed.len(), "dispatching fleet");

            let agents = std::mem::take(&mut self.agents);
            let results =
                fleet::solve_independent(Arc::clone(&self.dispatcher), agents, flex).await;

            for (agent, outcome) in results {
                reports.push(RoundReport {
                    round,
                    agent_id: agent.id,
                    agent_name: agent.name.clone(),
                    status: agent.last_status,
                    cost: outcome.ok().map(|s| s.cost),
                    flexed: flexed.contains(&agent.id),
                });
                self.agents.push(agent);
            }

            if let Some(worst) = reports
                .iter()
                .filter(|r| r.round == round)
                .max_by_key(|r| OrderedFloat(r.cost.unwrap_or(f64::NEG_INFINITY)))
            {
                tracing::info!(
                    round,
                    agent = %worst.agent_name,
                    cost = ?worst.cost,
                    "most expensive agent this round"
                );
            }
        }

        reports
    }

    /// Draw this round's flexibility requests: each agent is asked with
    /// `flex_probability` to charge or discharge a concrete amount at one
    /// random step. A request the agent cannot honor shows up as an
    /// infeasible round for that agent, which is a legitimate outcome.
    fn draw_flex(&mut self) -> FleetFlex {
        let mut flex = FleetFlex::new();
        for agent in &self.agents {
            if !self.rng.gen_bool(self.flex_probability) {
                continue;
            }
            let step = self.rng.gen_range(0..agent.series.len());
            let up = self.rng.gen_bool(0.5);
            let (min_rate, max_rate) = if up {
                (agent.params.min_char, agent.params.max_char)
            } else {
                (agent.params.min_dis, agent.params.max_dis)
            };
            if max_rate <= 0.0 {
                continue;
            }
            let lo = min_rate.max(0.2 * max_rate);
            let hi = (0.6 * max_rate).max(lo);
            let magnitude = if hi > lo {
                self.rng.gen_range(lo..=hi)
            } else {
                lo
            };
            let mut request = FlexRequest::new();
            if up {
                request.force_charge(step, magnitude);
            } else {
                request.force_discharge(step, magnitude);
            }
            flex.insert(agent.id, request);
        }
        flex
    }
}
