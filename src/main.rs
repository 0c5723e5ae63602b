use std::fs;

use anyhow::{Context, Result};
use ems_flex_market::config::Config;
use ems_flex_market::optimizer::MilpDispatcher;
use ems_flex_market::simulation::{scenario, MarketSimulation};
use ems_flex_market::{io, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let cfg = Config::load()?;

    let agents = scenario::build_fleet(&cfg.simulation, &cfg.battery)?;
    info!(
        agents = agents.len(),
        steps = cfg.simulation.steps,
        rounds = cfg.simulation.rounds,
        "starting flexibility-market simulation"
    );

    let dispatcher = MilpDispatcher::new(cfg.solver.time_budget_seconds);
    let mut sim = MarketSimulation::new(
        agents,
        dispatcher,
        cfg.simulation.rounds,
        cfg.simulation.flex_probability,
        cfg.simulation.seed,
    );
    let reports = sim.run().await;

    let out_dir = &cfg.output.dir;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    for agent in sim.agents() {
        let path = out_dir.join(format!("{}.csv", agent.name));
        io::export_schedule(agent, &path)
            .with_context(|| format!("exporting schedule for {}", agent.name))?;
    }
    let summary_csv = fs::File::create(out_dir.join("summary.csv"))?;
    io::write_summary(sim.agents(), summary_csv)?;
    let summary_json = fs::File::create(out_dir.join("summary.json"))?;
    io::write_summary_json(sim.agents(), summary_json)?;

    let optimal = reports
        .iter()
        .filter(|r| r.status == ems_flex_market::SolveStatus::Optimal)
        .count();
    info!(
        reports = reports.len(),
        optimal,
        output = %out_dir.display(),
        "simulation finished"
    );
    Ok(())
}
