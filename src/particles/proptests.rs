//! Property-based tests for the particle field
//!
//! These verify the animation invariants hold for arbitrary frame timings and
//! gesture sequences:
//! - The scale never overshoots its target
//! - The gap to a held target never grows
//! - Consecutive frames never jump further than one smoothing step allows

use super::field::{AnimationState, SHIMMER_AMPLITUDE, SHIMMER_FREQUENCY, SMOOTHING_RATE};
use super::*;
use crate::gesture::GestureSignal;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn arb_gesture() -> impl Strategy<Value = GestureSignal> {
    prop_oneof![
        Just(GestureSignal::Open),
        Just(GestureSignal::Closed),
        Just(GestureSignal::Unknown),
    ]
}

/// Frame durations from a 240 Hz display down to a one-second stall
fn arb_dt() -> impl Strategy<Value = f32> {
    0.0f32..1.0
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    prop_oneof![Just(Shape::Heart), Just(Shape::Firework)]
}

proptest! {
    #[test]
    fn prop_scale_stays_between_start_and_target(
        start in 0.1f32..3.0,
        gesture in arb_gesture(),
        dts in proptest::collection::vec(arb_dt(), 1..60),
    ) {
        let target = gesture.target_scale();
        let mut state = AnimationState::new(start);
        let low = start.min(target) - 1e-5;
        let high = start.max(target) + 1e-5;
        let mut gap = (target - start).abs();

        for dt in dts {
            state.step(target, dt);
            prop_assert!(state.current_scale >= low && state.current_scale <= high);
            let next_gap = (target - state.current_scale).abs();
            prop_assert!(next_gap <= gap + 1e-6);
            gap = next_gap;
        }
    }

    #[test]
    fn prop_frame_jumps_are_bounded(
        seed in any::<u64>(),
        shape in arb_shape(),
        frames in proptest::collection::vec((arb_dt(), arb_gesture()), 1..20),
    ) {
        let mut field = ParticleField::with_rng(shape, 200, StdRng::seed_from_u64(seed));
        field.update(0.0, GestureSignal::Unknown);
        let mut previous = field.positions().to_vec();

        for (dt, gesture) in frames {
            let before_scale = field.scale();
            field.update(dt, gesture);
            let step = (SMOOTHING_RATE * dt).min(1.0);
            let scale_delta = (field.scale() - before_scale).abs();
            prop_assert!(scale_delta <= (gesture.target_scale() - before_scale).abs() * step + 1e-5);

            let shimmer_bound = SHIMMER_AMPLITUDE * (SHIMMER_FREQUENCY * dt).min(2.0) + 1e-4;
            for (i, (now, then)) in field.positions().iter().zip(&previous).enumerate() {
                let base = field.base().positions[i].abs();
                prop_assert!((now - then).abs() <= base * scale_delta + shimmer_bound + 1e-4);
            }
            previous.copy_from_slice(field.positions());
        }
    }

    #[test]
    fn prop_buffers_stay_index_aligned(
        seed in any::<u64>(),
        shapes in proptest::collection::vec(arb_shape(), 1..5),
    ) {
        let mut field = ParticleField::with_rng(Shape::Heart, 100, StdRng::seed_from_u64(seed));
        for shape in shapes {
            field.set_shape(shape);
            field.update(0.016, GestureSignal::Open);
            prop_assert_eq!(field.positions().len(), 300);
            prop_assert_eq!(field.colors().len(), 300);
            prop_assert_eq!(field.base().positions.len(), 300);
        }
    }
}
