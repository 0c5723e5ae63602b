//! Synthetic fleet construction.
//!
//! Builds agents with a daily price pattern (cheap night, expensive day),
//! a midday photovoltaic bell and a morning/evening demand shape, with
//! seeded per-agent noise so runs are reproducible.

use anyhow::{Context, Result};
use chrono::{NaiveTime, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{BatteryConfig, SimulationConfig};
use crate::domain::{Agent, TimeSeries, TimeStep};
use crate::utils::time::clock_for_step;

/// Build the configured number of agents with seeded profiles.
pub fn build_fleet(sim: &SimulationConfig, battery: &BatteryConfig) -> Result<Vec<Agent>> {
    let start = NaiveTime::parse_from_str(&sim.day_start, "%H:%M")
        .with_context(|| format!("invalid day_start {:?}", sim.day_start))?;
    let mut rng = StdRng::seed_from_u64(sim.seed);

    let params = battery.to_params();
    params
        .validate()
        .context("battery defaults fail validation")?;

    (0..sim.agents)
        .map(|i| {
            let steps = profile(&mut rng, start, sim.step_minutes, sim.steps);
            let series = TimeSeries::new(start, sim.step_minutes, steps);
            Ok(Agent::new(format!("ems-{i:02}"), series, params.clone()))
        })
        .collect()
}

fn profile(rng: &mut StdRng, start: NaiveTime, step_minutes: u32, steps: usize) -> Vec<TimeStep> {
    (0..steps)
        .map(|t| {
            let clock = clock_for_step(start, step_minutes, t);
            let hour = clock.hour() as f64 + clock.minute() as f64 / 60.0;

            // Price: low at night, peaking in the afternoon.
            let base_price = if (9.0..=18.0).contains(&hour) {
                2.0
            } else if (6.0..9.0).contains(&hour) || (18.0..22.0).contains(&hour) {
                1.2
            } else {
                0.6
            };
            let mp = base_price * rng.gen_range(0.9..1.1);
            let fp = 0.8 * mp;

            // Photovoltaics: a bell between 06:00 and 18:00.
            let pv = if (6.0..18.0).contains(&hour) {
                let x = (hour - 6.0) / 12.0 * std::f64::consts::PI;
                3.0 * x.sin() * rng.gen_range(0.8..1.0)
            } else {
                0.0
            };

            // Demand: base load with morning and evening bumps.
            let bump = if (6.0..9.0).contains(&hour) || (17.0..21.0).contains(&hour) {
                1.5
            } else {
                0.0
            };
            let dem = (1.0 + bump) * rng.gen_range(0.9..1.1);

            TimeStep::new(mp, fp, pv, dem)
        })
        .collect()
}
