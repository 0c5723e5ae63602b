use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Direction and magnitude of a forced deviation at one step.
///
/// The convention is explicit: an `Up` directive forces `char` to the given
/// value, a `Down` directive forces `dis`. Holding one directive per step
/// makes the "at most one of up/down per step" rule unrepresentable to
/// violate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FlexDirective {
    /// Force charging to exactly this value.
    Up(f64),
    /// Force discharging to exactly this value.
    Down(f64),
}

impl FlexDirective {
    pub fn magnitude(&self) -> f64 {
        match self {
            FlexDirective::Up(v) | FlexDirective::Down(v) => *v,
        }
    }
}

/// Externally supplied per-step directives overlaid on a dispatch solve.
///
/// An empty request means no overlay constraints; a missing request is
/// treated the same way by the optimizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlexRequest {
    directives: IndexMap<usize, FlexDirective>,
}

impl FlexRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force `char[step]` to `value`. Replaces any earlier directive for
    /// that step.
    pub fn force_charge(&mut self, step: usize, value: f64) -> &mut Self {
        self.directives.insert(step, FlexDirective::Up(value));
        self
    }

    /// Force `dis[step]` to `value`. Replaces any earlier directive for
    /// that step.
    pub fn force_discharge(&mut self, step: usize, value: f64) -> &mut Self {
        self.directives.insert(step, FlexDirective::Down(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, FlexDirective)> + '_ {
        self.directives.iter().map(|(step, d)| (*step, *d))
    }

    /// Directives must target steps inside the horizon and carry positive,
    /// finite magnitudes. A zero magnitude is a no-op in the source data
    /// format and is rejected here rather than silently dropped.
    pub fn validate(&self, horizon: usize) -> Result<(), DispatchError> {
        for (step, directive) in self.iter() {
            if step >= horizon {
                return Err(DispatchError::Configuration(format!(
                    "flex directive at step {step} outside horizon of {horizon} steps"
                )));
            }
            let value = directive.magnitude();
            if !value.is_finite() || value <= 0.0 {
                return Err(DispatchError::Configuration(format!(
                    "flex directive at step {step} must be positive and finite (got {value})"
                )));
            }
        }
        Ok(())
    }
}
