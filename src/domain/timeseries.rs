use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::utils::time::clock_for_step;

/// One discrete step of an agent's horizon.
///
/// The first four fields are immutable inputs for a given optimization run;
/// the rest are decision values written back after an optimal solve.
/// Outflows (`sell`, `dis`) are stored sign-flipped (non-positive) so that
/// an exported series reads as signed flows from the agent's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeStep {
    /// Market price to buy.
    pub mp: f64,
    /// Feed-in price to sell.
    pub fp: f64,
    /// Photovoltaic generation.
    pub pv: f64,
    /// Demand forecast.
    pub dem: f64,

    pub buy: f64,
    pub sell: f64,
    /// State of charge after this step's action.
    pub cap: f64,
    pub char: f64,
    pub dis: f64,
    pub buy_switch: bool,
    pub sell_switch: bool,
    pub char_switch: bool,
    pub dis_switch: bool,
}

impl TimeStep {
    pub fn new(mp: f64, fp: f64, pv: f64, dem: f64) -> Self {
        Self {
            mp,
            fp,
            pv,
            dem,
            buy: 0.0,
            sell: 0.0,
            cap: 0.0,
            char: 0.0,
            dis: 0.0,
            buy_switch: false,
            sell_switch: false,
            char_switch: false,
            dis_switch: false,
        }
    }
}

/// Ordered, contiguous horizon of [`TimeStep`]s plus step-duration metadata.
///
/// Step indices run 0..len(); the clock time of step `t` is derived from
/// `start` and `step_minutes`, wrapping past midnight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub start: NaiveTime,
    pub step_minutes: u32,
    pub steps: Vec<TimeStep>,
}

impl TimeSeries {
    pub fn new(start: NaiveTime, step_minutes: u32, steps: Vec<TimeStep>) -> Self {
        Self {
            start,
            step_minutes,
            steps,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Clock time at which step `index` begins.
    pub fn clock_at(&self, index: usize) -> NaiveTime {
        clock_for_step(self.start, self.step_minutes, index)
    }

    /// Fail fast on an empty or ill-formed horizon, before any model
    /// construction.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.steps.is_empty() {
            return Err(DispatchError::Configuration("time series is empty".into()));
        }
        if self.step_minutes == 0 {
            return Err(DispatchError::Configuration(
                "step duration must be positive".into(),
            ));
        }
        for (t, step) in self.steps.iter().enumerate() {
            if !(step.mp.is_finite() && step.fp.is_finite()) {
                return Err(DispatchError::Configuration(format!(
                    "non-finite price at step {t}"
                )));
            }
            if !step.pv.is_finite() || step.pv < 0.0 {
                return Err(DispatchError::Configuration(format!(
                    "generation must be finite and non-negative at step {t} (got {})",
                    step.pv
                )));
            }
            if !step.dem.is_finite() || step.dem < 0.0 {
                return Err(DispatchError::Configuration(format!(
                    "demand must be finite and non-negative at step {t} (got {})",
                    step.dem
                )));
            }
        }
        Ok(())
    }
}
