use proptest::prelude::*;
use sleepwell_core::fade;
use sleepwell_core::session::SessionClock;

fn duration_strategy() -> impl Strategy<Value = u32> {
    1u32..=240
}

proptest! {
    /// Brightness never increases as time moves forward.
    #[test]
    fn brightness_is_non_increasing(
        duration in duration_strategy(),
        t1 in 0i64..20_000_000,
        dt in 0i64..20_000_000,
    ) {
        let a = fade::compute(0, t1, duration);
        let b = fade::compute(0, t1 + dt, duration);
        prop_assert!(b.brightness <= a.brightness);
        prop_assert!((0.0..=1.0).contains(&a.brightness));
        prop_assert!(b.seconds_remaining >= 0.0);
    }

    /// Brightness and progress always sum to one.
    #[test]
    fn brightness_complements_progress(
        duration in duration_strategy(),
        now in -1_000_000i64..20_000_000,
    ) {
        let frame = fade::compute(0, now, duration);
        prop_assert!((frame.brightness + frame.progress - 1.0).abs() < 1e-12);
        prop_assert_eq!(frame.complete, frame.progress >= 1.0);
    }

    /// A pause of length P shifts the whole trajectory by exactly P.
    #[test]
    fn pause_is_neutral(
        duration in duration_strategy(),
        before in 0i64..10_000_000,
        paused in 0i64..10_000_000,
        after in 0i64..10_000_000,
    ) {
        let mut clock = SessionClock::start(0);
        clock.pause(before);
        let frozen = fade::compute(clock.started_at_ms(), before, duration);
        clock.resume(before + paused);

        let with_pause = fade::compute(clock.started_at_ms(), before + paused + after, duration);
        let without_pause = fade::compute(0, before + after, duration);
        prop_assert!((with_pause.brightness - without_pause.brightness).abs() < 1e-9);
        prop_assert!((with_pause.seconds_remaining - without_pause.seconds_remaining).abs() < 1e-6);

        // Right after resuming the fade picks up where it froze.
        let resumed = fade::compute(clock.started_at_ms(), before + paused, duration);
        prop_assert!((resumed.brightness - frozen.brightness).abs() < 1e-9);
    }
}
