//! Property-based tests for the playback controller
//!
//! Uses proptest to verify invariants across many random inputs.

mod common;

use cadence_playback::{
    EventKind, MemoryQueue, PlaybackConfig, PlaybackError, PlaybackState, PrimitiveSignal,
    QueueStore,
};
use common::{harness, harness_with, items};
use proptest::prelude::*;

proptest! {
    /// Property: play(index) with a valid index always lands on that index
    #[test]
    fn valid_play_sets_position(len in 1usize..30, seed in any::<usize>()) {
        let index = seed % len;
        let mut h = harness(len);

        h.controller.play(index).unwrap();

        prop_assert_eq!(h.controller.position(), index);
        prop_assert_eq!(h.controller.state(), PlaybackState::Loading);
        prop_assert_eq!(
            h.recorder.kinds(),
            vec![EventKind::Preloading, EventKind::Loading]
        );

        h.controller.handle_signal(PrimitiveSignal::CanPlay);
        h.controller.handle_signal(PrimitiveSignal::CanPlay);
        prop_assert_eq!(h.controller.state(), PlaybackState::Playing);
        prop_assert_eq!(h.recorder.count(EventKind::TrackStart), 1);
        prop_assert_eq!(h.recorder.count(EventKind::Playing), 2);
    }

    /// Property: out-of-range play never publishes or moves
    #[test]
    fn out_of_range_play_is_rejected(
        len in 0usize..30,
        over in 0usize..100,
        start in any::<usize>(),
    ) {
        let mut h = harness(len);
        if len > 0 {
            h.controller.queue_mut().set_position(start % len);
        }
        let before = h.controller.position();

        let result = h.controller.play(len + over);

        prop_assert_eq!(
            result,
            Err(PlaybackError::IndexOutOfRange { index: len + over, len })
        );
        prop_assert!(h.recorder.all().is_empty());
        prop_assert_eq!(h.controller.position(), before);
        prop_assert!(h.primitive.loads().is_empty());
    }

    /// Property: each 5% multiple fires at most once per attempt, whatever the sampling
    #[test]
    fn progress_fires_once_per_multiple(
        duration in 1.0f64..600.0,
        steps in prop::collection::vec(0.0f64..2.0, 1..400),
        jitter in prop::collection::vec(-0.5f64..0.5, 1..400),
    ) {
        let config = PlaybackConfig {
            minute_events: false,
            ..PlaybackConfig::default()
        };
        let mut h = harness_with(MemoryQueue::from_items(items(1)), config);
        h.controller.play(0).unwrap();
        h.controller.handle_signal(PrimitiveSignal::CanPlay);
        h.recorder.clear();

        let mut t = 0.0;
        for (i, step) in steps.iter().enumerate() {
            t += step;
            let d = duration + jitter[i % jitter.len()];
            h.primitive.set_duration(Some(d.max(0.5)));
            h.primitive.set_time(t);
            h.controller.handle_signal(PrimitiveSignal::TimeUpdate);
        }

        let fired: Vec<u32> = h
            .recorder
            .of(EventKind::Progress)
            .iter()
            .map(|n| n.progress)
            .collect();
        let mut unique = fired.clone();
        unique.sort_unstable();
        unique.dedup();

        prop_assert_eq!(unique.len(), fired.len());
        prop_assert!(fired.iter().all(|p| *p > 0 && *p <= 100 && p % 5 == 0));
    }

    /// Property: navigation never leaves the position outside the queue
    #[test]
    fn navigation_keeps_position_in_range(
        len in 1usize..20,
        operations in prop::collection::vec(0u8..6, 1..60),
    ) {
        let mut h = harness_with(
            MemoryQueue::from_items(items(len)).with_smart_previous(true),
            PlaybackConfig::default(),
        );

        for op in operations {
            match op {
                0 => { h.controller.next().unwrap(); }
                1 => { h.controller.previous().unwrap(); }
                2 => h.controller.handle_signal(PrimitiveSignal::CanPlay),
                3 => h.controller.handle_signal(PrimitiveSignal::Ended),
                4 => h.controller.handle_signal(PrimitiveSignal::Error("boom".to_string())),
                _ => h.controller.stop(),
            }
            prop_assert!(h.controller.position() < len);
            prop_assert!(h.controller.queue().position() < len);
        }
    }
}
