//! Solution invariants over randomized feasible instances.
//!
//! Instances are constructed so that a feasible schedule always exists
//! (generous market bounds, boundary state of charge equal at both ends,
//! no minimum rates), so every solve must come back optimal and satisfy
//! the per-step invariants.

use chrono::NaiveTime;
use ems_flex_market::{BatteryParams, MilpDispatcher, SolveStatus, TimeSeries, TimeStep};
use proptest::prelude::*;

const EPS: f64 = 1e-5;

#[derive(Debug, Clone)]
struct Instance {
    series: TimeSeries,
    params: BatteryParams,
}

fn instance_strategy() -> impl Strategy<Value = Instance> {
    let step = (0.1f64..5.0, 0.1f64..1.0, 0.0f64..3.0, 0.0f64..3.0);
    (
        prop::collection::vec(step, 1..=4),
        2.0f64..8.0,
        0.0f64..1.0,
        0.5f64..4.0,
    )
        .prop_map(|(rows, thres_up, soc_frac, rate)| {
            let steps = rows
                .into_iter()
                .map(|(mp, fp_ratio, pv, dem)| TimeStep::new(mp, mp * fp_ratio, pv, dem))
                .collect();
            let series =
                TimeSeries::new(NaiveTime::from_hms_opt(0, 0, 0).unwrap(), 60, steps);
            let soc = soc_frac * thres_up;
            let params = BatteryParams {
                max_buy: 20.0,
                max_sell: 20.0,
                min_dis: 0.0,
                max_dis: rate,
                min_char: 0.0,
                max_char: rate,
                thres_down: 0.0,
                thres_up,
                init_soc: soc,
                end_soc: soc,
            };
            Instance { series, params }
        })
}

proptest! {
    // Each case is one CBC solve; keep the count moderate.
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn feasible_instances_solve_optimally_and_hold_invariants(
        instance in instance_strategy()
    ) {
        let schedule = MilpDispatcher::default()
            .solve(&instance.series, &instance.params, None)
            .expect("constructed instance must be feasible");

        prop_assert_eq!(schedule.status, SolveStatus::Optimal);

        // Boundary state of charge is met exactly.
        prop_assert!((schedule.soc[0] - instance.params.init_soc).abs() < EPS);
        let last = *schedule.soc.last().unwrap();
        prop_assert!((last - instance.params.end_soc).abs() < EPS);

        for (t, (decision, step)) in schedule
            .decisions
            .iter()
            .zip(&instance.series.steps)
            .enumerate()
        {
            // Power balance.
            let balance =
                decision.buy + step.pv + decision.dis - decision.sell - step.dem - decision.char;
            prop_assert!(balance.abs() < EPS, "balance {} at step {}", balance, t);

            // Mutual exclusion in every feasible solution.
            prop_assert!(!(decision.char_switch && decision.dis_switch));
            prop_assert!(!(decision.buy_switch && decision.sell_switch));
            prop_assert!(!(decision.char > EPS && decision.dis > EPS));
            prop_assert!(!(decision.buy > EPS && decision.sell > EPS));

            // Trajectory stays inside the capacity thresholds.
            prop_assert!(schedule.soc[t + 1] >= instance.params.thres_down - EPS);
            prop_assert!(schedule.soc[t + 1] <= instance.params.thres_up + EPS);
        }
    }
}
