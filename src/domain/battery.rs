use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Static per-agent battery and market configuration.
///
/// Energies share the series' per-step unit; `thres_down` / `thres_up`
/// bound the state of charge at every step, `init_soc` / `end_soc` pin the
/// trajectory's boundary values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryParams {
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

impl BatteryParams {
    /// Check the parameter invariants.
    ///
    /// Runs before any solver invocation; a violation surfaces as
    /// [`DispatchError::Configuration`] instead of an undiagnosed
    /// infeasibility downstream.
    pub fn validate(&self) -> Result<(), DispatchError> {
        let fields = [
            ("max_buy", self.max_buy),
            ("max_sell", self.max_sell),
            ("min_dis", self.min_dis),
            ("max_dis", self.max_dis),
            ("min_char", self.min_char),
            ("max_char", self.max_char),
            ("thres_down", self.thres_down),
            ("thres_up", self.thres_up),
            ("init_soc", self.init_soc),
            ("end_soc", self.end_soc),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(DispatchError::Configuration(format!(
                    "{name} must be finite (got {value})"
                )));
            }
        }
        if self.max_buy < 0.0 || self.max_sell < 0.0 {
            return Err(DispatchError::Configuration(
                "market bounds max_buy/max_sell must be non-negative".into(),
            ));
        }
        if self.min_dis < 0.0 || self.min_char < 0.0 {
            return Err(DispatchError::Configuration(
                "minimum charge/discharge rates must be non-negative".into(),
            ));
        }
        if self.min_dis > self.max_dis {
            return Err(DispatchError::Configuration(format!(
                "min_dis {} exceeds max_dis {}",
                self.min_dis, self.max_dis
            )));
        }
        if self.min_char > self.max_char {
            return Err(DispatchError::Configuration(format!(
                "min_char {} exceeds max_char {}",
                self.min_char, self.max_char
            )));
        }
        if self.thres_down > self.thres_up {
            return Err(DispatchError::Configuration(format!(
                "thres_down {} exceeds thres_up {}",
                self.thres_down, self.thres_up
            )));
        }
        for (name, soc) in [("init_soc", self.init_soc), ("end_soc", self.end_soc)] {
            if soc < self.thres_down || soc > self.thres_up {
                return Err(DispatchError::Configuration(format!(
                    "{name} {} outside capacity thresholds [{}, {}]",
                    soc, self.thres_down, self.thres_up
                )));
            }
        }
        Ok(())
    }
}
