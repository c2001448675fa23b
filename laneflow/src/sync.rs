//! Clock-domain crossing of counters.

use std::sync::atomic::{AtomicU32, Ordering};

use static_assertions::const_assert;

use crate::gray;

/// Number of synchronizer stages between two clock domains.
pub const SYNC_STAGES: usize = 2;

const_assert!(SYNC_STAGES >= 2);

/// A counter published by its owning clock domain in Gray code.
///
/// Only the owner stores; every other domain loads and must pass the value through a
/// [`Synchronizer`] before using it.
#[derive(Debug, Default)]
pub struct GrayCell(AtomicU32);

impl GrayCell {
    /// Creates a cell publishing `value`.
    pub fn new(value: u32) -> Self { Self(AtomicU32::new(gray::encode(value))) }

    /// Publishes a new binary value.
    pub fn publish(&self, value: u32) { self.0.store(gray::encode(value), Ordering::Release); }

    /// Loads the raw Gray-coded value.
    pub fn load_gray(&self) -> u32 { self.0.load(Ordering::Acquire) }
}

/// Shift register that samples a Gray-coded value once per tick of the receiving domain.
///
/// The output lags the input by `STAGES` ticks. Because consecutive Gray values differ in one bit,
/// a sample taken mid-update is off by at most one.
#[derive(Debug, Clone)]
pub struct Synchronizer<const STAGES: usize = SYNC_STAGES> {
    stages: [u32; STAGES],
}

impl<const STAGES: usize> Synchronizer<STAGES> {
    /// Creates a synchronizer holding `value` in every stage.
    pub fn new(value: u32) -> Self { Self { stages: [gray::encode(value); STAGES] } }

    /// Shifts a new sample in and returns the decoded value leaving the last stage.
    pub fn sample(&mut self, raw_gray: u32) -> u32 {
        self.stages.rotate_right(1);
        self.stages[0] = raw_gray;
        self.output()
    }

    /// Decoded value of the last stage.
    pub fn output(&self) -> u32 { gray::decode(self.stages[STAGES - 1]) }

    /// Fills every stage with `value`.
    pub fn reset(&mut self, value: u32) { self.stages = [gray::encode(value); STAGES]; }
}

/// Shift register that carries a level signal into the receiving domain, `STAGES` ticks late.
#[derive(Debug, Clone)]
pub struct FlagSynchronizer<const STAGES: usize = SYNC_STAGES> {
    stages: [bool; STAGES],
}

impl<const STAGES: usize> FlagSynchronizer<STAGES> {
    /// Creates a synchronizer holding `value` in every stage.
    pub fn new(value: bool) -> Self { Self { stages: [value; STAGES] } }

    /// Shifts a new sample in and returns the value leaving the last stage.
    pub fn sample(&mut self, flag: bool) -> bool {
        self.stages.rotate_right(1);
        self.stages[0] = flag;
        self.output()
    }

    /// Value of the last stage.
    pub fn output(&self) -> bool { self.stages[STAGES - 1] }

    /// Fills every stage with `value`.
    pub fn reset(&mut self, value: bool) { self.stages = [value; STAGES]; }
}
