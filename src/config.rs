use std::path::PathBuf;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::domain::BatteryParams;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub solver: SolverConfig,
    pub simulation: SimulationConfig,
    pub battery: BatteryConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolverConfig {
    /// Wall-clock budget per solve, in seconds.
    pub time_budget_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    pub agents: usize,
    pub steps: usize,
    pub rounds: usize,
    pub step_minutes: u32,
    /// Clock time of the first step, "HH:MM".
    pub day_start: String,
    pub seed: u64,
    /// Per-agent, per-round probability of receiving a flexibility request.
    pub flex_probability: f64,
}

/// Battery defaults applied to every generated agent.
#[derive(Debug, Clone, Deserialize)]
pub struct BatteryConfig {
    pub max_buy: f64,
    pub max_sell: f64,
    pub min_dis: f64,
    pub max_dis: f64,
    pub min_char: f64,
    pub max_char: f64,
    pub thres_down: f64,
    pub thres_up: f64,
    pub init_soc: f64,
    pub end_soc: f64,
}

impl BatteryConfig {
    pub fn to_params(&self) -> BatteryParams {
        BatteryParams {
            max_buy: self.max_buy,
            max_sell: self.max_sell,
            min_dis: self.min_dis,
            max_dis: self.max_dis,
            min_char: self.min_char,
            max_char: self.max_char,
            thres_down: self.thres_down,
            thres_up: self.thres_up,
            init_soc: self.init_soc,
            end_soc: self.end_soc,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("EMS__").split("__"));
        Ok(figment.extract()?)
    }
}
