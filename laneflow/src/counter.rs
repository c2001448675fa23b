//! Counters.

/// Circular pointer into a power-of-two sized slot array.
///
/// The raw value increments monotonically (wrapping at `u32::MAX`); the slot index is the raw value
/// masked by the slot count. Distances between two pointers are taken modulo the slot count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pointer {
    value: u32,
    mask: u32,
}

impl Pointer {
    /// Creates a pointer over `slots` slots, starting at `value`.
    ///
    /// `slots` must be a power of two.
    pub fn new(slots: usize, value: u32) -> Self {
        debug_assert!(slots.is_power_of_two());
        Self { value, mask: (slots - 1) as u32 }
    }

    /// Raw (unmasked) value.
    pub fn value(self) -> u32 { self.value }

    /// Slot index.
    pub fn slot(self) -> usize { (self.value & self.mask) as usize }

    /// Slot index `ahead` positions after this pointer.
    pub fn slot_ahead(self, ahead: u32) -> usize { (self.value.wrapping_add(ahead) & self.mask) as usize }

    /// Advances the pointer.
    pub fn advance(&mut self, by: u32) { self.value = self.value.wrapping_add(by); }

    /// Number of slots from `other` up to `self`, modulo the slot count.
    pub fn distance_from(self, other: u32) -> usize { (self.value.wrapping_sub(other) & self.mask) as usize }
}

/// Counter that increments up to `bound` and then holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaturatingCounter {
    value: u8,
    init: u8,
    bound: u8,
}

impl SaturatingCounter {
    /// Creates a counter starting at `init`, saturating at `bound`.
    pub fn new(init: u8, bound: u8) -> Self {
        debug_assert!(init <= bound);
        Self { value: init, init, bound }
    }

    /// Current value.
    pub fn value(self) -> u8 { self.value }

    /// Whether the counter has reached its bound.
    pub fn is_saturated(self) -> bool { self.value == self.bound }

    /// Increments by one when `up` is set and the bound is not yet reached.
    pub fn step(&mut self, up: bool) {
        if up && !self.is_saturated() {
            self.value += 1;
        }
    }

    /// Returns to the initial value.
    pub fn reset(&mut self) { self.value = self.init; }
}
