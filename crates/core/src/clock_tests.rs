// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_epoch_is_plausible() {
    // Anything after 2020-01-01 counts as a working wall clock.
    assert!(SystemClock.epoch_millis() > 1_577_836_800_000);
}

#[test]
fn system_clock_does_not_go_backwards() {
    let t1 = SystemClock.epoch_millis();
    std::thread::sleep(Duration::from_millis(2));
    assert!(SystemClock.epoch_millis() >= t1);
}

#[test]
fn fake_clock_advance_moves_time() {
    let clock = FakeClock::new();
    let e1 = clock.epoch_millis();
    clock.advance(Duration::from_secs(90));
    assert_eq!(clock.epoch_millis(), e1 + 90_000);
}

#[test]
fn fake_clock_clones_share_time() {
    let a = FakeClock::new();
    let b = a.clone();
    b.advance(Duration::from_secs(30));
    assert_eq!(a.epoch_millis(), b.epoch_millis());
}

#[test]
fn fake_clock_set_epoch() {
    let clock = FakeClock::new();
    clock.set_epoch_millis(42);
    assert_eq!(clock.epoch_millis(), 42);
}

#[test]
fn fake_clock_works_as_a_trait_object() {
    let clock = FakeClock::new();
    clock.set_epoch_millis(7_000);
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    assert_eq!(shared.epoch_millis(), 7_000);
    clock.advance(Duration::from_secs(1));
    assert_eq!(shared.epoch_millis(), 8_000);
}
