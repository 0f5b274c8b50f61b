//! Wrapping time value tests for agon-rt-core

use agon_rt_core::{Micros, Millis};

#[test]
fn test_elapsed_across_wrap() {
    let before = Millis::new(u32::MAX - 2);
    let after = before.wrapping_add(5);
    assert_eq!(after.raw(), 2);
    assert_eq!(after.elapsed_since(before), 5);
}

#[test]
fn test_is_after_handles_wrap() {
    let before = Micros::new(u32::MAX);
    let after = Micros::new(10);
    assert!(after.is_after(before));
    assert!(!before.is_after(after));
    assert!(!after.is_after(after));
}

#[test]
fn test_millis_to_micros() {
    assert_eq!(Millis::new(1234).to_micros(), Micros::new(1_234_000));
}

#[test]
fn test_display() {
    assert_eq!(format!("{}", Millis::new(5)), "5ms");
    assert_eq!(format!("{}", Micros::new(7)), "7us");
}
