use std::time::Duration;

use proptest::prelude::*;

use dms::{DmsConfig, DrowsinessMachine, EyeState};

const THRESHOLD: f64 = 0.15;

fn machine() -> DrowsinessMachine {
    DrowsinessMachine::new(&DmsConfig::default(), Duration::ZERO)
}

/// Frame gaps in milliseconds, including some well beyond the clamp
fn gaps() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0_u64..2_500, 1..60)
}

proptest! {
    #[test]
    fn pt_no_face_always_resets(
        history in prop::collection::vec((any::<bool>(), 0.0_f64..0.5), 0..30),
        ratio in 0.0_f64..1.0,
    ) {
        let mut m = machine();
        let mut t = Duration::ZERO;
        for (face, r) in history {
            t += Duration::from_millis(200);
            m.step(face, r, t);
        }

        let step = m.step(false, ratio, t + Duration::from_millis(200));
        prop_assert_eq!(step.eye_state, EyeState::NoFace);
        prop_assert_eq!(step.closed_seconds, 0.0);
        prop_assert!(step.alert.is_none());
    }

    #[test]
    fn pt_open_eyes_never_accumulate(
        steps in prop::collection::vec((THRESHOLD..2.0_f64, 0_u64..3_000), 1..50),
    ) {
        let mut m = machine();
        let mut t = Duration::ZERO;
        for (ratio, gap) in steps {
            t += Duration::from_millis(gap);
            let step = m.step(true, ratio, t);
            prop_assert_eq!(step.eye_state, EyeState::Open);
            prop_assert_eq!(step.closed_seconds, 0.0);
            prop_assert!(step.alert.is_none());
        }
    }

    #[test]
    fn pt_closed_accumulator_is_sum_of_clamped_gaps(gaps in gaps()) {
        let config = DmsConfig::default();
        let max_dt = Duration::from_secs_f64(config.max_dt_clamp_seconds);
        let alert_after = Duration::from_secs_f64(config.alert_seconds);
        let mut m = machine();
        let mut t = Duration::ZERO;
        let mut expected = Duration::ZERO;

        for gap in gaps {
            t += Duration::from_millis(gap);
            let before = m.state().closed_for();
            let step = m.step(true, 0.05, t);

            let dt = Duration::from_millis(gap).min(max_dt);
            prop_assert_eq!(step.dt_seconds, dt.as_secs_f64());
            expected += dt;

            if step.alert.is_some() {
                prop_assert!(expected >= alert_after);
                prop_assert_eq!(m.state().closed_for(), Duration::ZERO);
                expected = Duration::ZERO;
            } else {
                prop_assert!(m.state().closed_for() >= before);
                prop_assert_eq!(m.state().closed_for(), expected);
                prop_assert!(expected < alert_after);
            }
        }
    }

    #[test]
    fn pt_alert_at_most_once_per_alert_window(gaps in gaps()) {
        let config = DmsConfig::default();
        let mut m = machine();
        let mut t = Duration::ZERO;
        let mut credited = 0.0_f64;
        let mut alerts = 0_u32;

        for gap in gaps {
            t += Duration::from_millis(gap);
            let step = m.step(true, 0.0, t);
            credited += step.dt_seconds;
            if step.alert.is_some() {
                alerts += 1;
            }
        }

        prop_assert!(alerts as f64 * config.alert_seconds <= credited + 1e-6);
    }

    #[test]
    fn pt_invalid_samples_leave_accumulator_alone(
        warmup in 1_usize..5,
        bad_ratio in prop_oneof![Just(f64::NAN), Just(f64::INFINITY), -10.0_f64..-0.001],
    ) {
        let mut m = machine();
        let mut t = Duration::ZERO;
        for _ in 0..warmup {
            t += Duration::from_millis(400);
            m.step(true, 0.05, t);
        }
        let before = m.state().clone();

        t += Duration::from_millis(400);
        let step = m.step(true, bad_ratio, t);

        prop_assert!(step.rejection.is_some());
        prop_assert_eq!(m.state().closed_seconds(), before.closed_seconds());
        prop_assert_eq!(m.state().eye_state(), before.eye_state());
    }
}

#[test]
fn scenario_sustained_closure_alerts_once_and_resets() {
    let mut m = machine();
    let closed: Vec<_> = (1..=3)
        .map(|s| m.step(true, 0.10, Duration::from_secs(s)))
        .collect();

    assert_eq!(closed[0].closed_seconds, 1.0);
    assert_eq!(closed[1].closed_seconds, 2.0);
    assert!(closed[2].alert.is_some());
    assert_eq!(closed[2].closed_seconds, 0.0);

    // Still below threshold: a fresh episode starts from zero
    let next = m.step(true, 0.10, Duration::from_secs(4));
    assert!(next.alert.is_none());
    assert_eq!(next.closed_seconds, 1.0);
}

#[test]
fn scenario_face_loss_mid_closure() {
    let mut m = machine();
    let sequence: Vec<f64> = [(true, 0.10), (false, 0.0), (true, 0.10)]
        .into_iter()
        .zip(1..)
        .map(|((face, ratio), s)| {
            let step = m.step(face, ratio, Duration::from_secs(s));
            assert!(step.alert.is_none());
            step.closed_seconds
        })
        .collect();

    assert_eq!(sequence, vec![1.0, 0.0, 1.0]);
}

#[test]
fn scenario_paused_process_is_clamped() {
    let mut m = machine();
    let step = m.step(true, 0.10, Duration::from_secs(50));
    assert_eq!(step.dt_seconds, 1.0);
    assert_eq!(step.closed_seconds, 1.0);
}

#[test]
fn scenario_ratio_on_threshold_is_open() {
    let mut m = machine();
    let step = m.step(true, THRESHOLD, Duration::from_secs(1));
    assert_eq!(step.eye_state, EyeState::Open);
}

#[test]
fn scenario_fractional_frame_gaps_alert_on_time() {
    for (gap_ms, alert_frame) in [(50_u64, 60_u64), (100, 30), (200, 15), (75, 40)] {
        let mut m = machine();
        let fired: Vec<u64> = (1..=alert_frame + 5)
            .filter(|i| {
                m.step(true, 0.05, Duration::from_millis(gap_ms * i))
                    .alert
                    .is_some()
            })
            .collect();
        assert_eq!(fired, vec![alert_frame], "gap {gap_ms}ms");
    }
}
