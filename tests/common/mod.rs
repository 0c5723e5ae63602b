//! Shared fixtures for integration tests.

use chrono::NaiveTime;
use ems_flex_market::{BatteryParams, TimeSeries, TimeStep};

pub const EPS: f64 = 1e-6;

/// Hourly series from `(mp, fp, pv, dem)` tuples, starting at midnight.
pub fn series(rows: &[(f64, f64, f64, f64)]) -> TimeSeries {
    let steps = rows
        .iter()
        .map(|(mp, fp, pv, dem)| TimeStep::new(*mp, *fp, *pv, *dem))
        .collect();
    TimeSeries::new(NaiveTime::from_hms_opt(0, 0, 0).unwrap(), 60, steps)
}

/// A permissive battery: generous market bounds, 10-unit capacity, no
/// minimum rates, balanced boundary state.
pub fn battery() -> BatteryParams {
    BatteryParams {
        max_buy: 50.0,
        max_sell: 50.0,
        min_dis: 0.0,
        max_dis: 5.0,
        min_char: 0.0,
        max_char: 5.0,
        thres_down: 0.0,
        thres_up: 10.0,
        init_soc: 5.0,
        end_soc: 5.0,
    }
}

/// A battery pinned to zero capacity: it cannot participate at all.
pub fn no_battery() -> BatteryParams {
    BatteryParams {
        max_buy: 50.0,
        max_sell: 50.0,
        min_dis: 0.0,
        max_dis: 5.0,
        min_char: 0.0,
        max_char: 5.0,
        thres_down: 0.0,
        thres_up: 0.0,
        init_soc: 0.0,
        end_soc: 0.0,
    }
}
