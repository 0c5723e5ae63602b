//! Multi-agent energy-flexibility market simulation.
//!
//! Each EMS agent owns a battery, photovoltaic generation and a demand
//! forecast, and schedules charge/discharge/buy/sell decisions over a time
//! horizon at minimum cost. The core is a single parameterized MILP
//! dispatch solve ([`optimizer::MilpDispatcher`]); a fleet can be solved
//! either as independent parallel models or as one combined model with a
//! per-agent variable namespace ([`optimizer::fleet`]).

pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod optimizer;
pub mod simulation;
pub mod telemetry;
pub mod utils;

pub use domain::{Agent, BatteryParams, FlexDirective, FlexRequest, TimeSeries, TimeStep};
pub use error::DispatchError;
pub use optimizer::{DispatchSchedule, DispatchStrategy, MilpDispatcher, SolveStatus};
