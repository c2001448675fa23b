//! Link constants.

use static_assertions::const_assert;

use crate::types::Symbol;

/// Width of a channel symbol in bits.
pub const SYMBOL_BITS: u32 = 10;

/// Upper bound on lanes in one link.
pub const MAX_LANES: usize = 16;

/// Default compensation buffer capacity (entries).
pub const DEFAULT_ELASTIC_CAPACITY: usize = 16;

/// Smallest compensation buffer that leaves room for the target ±2 band.
pub const MIN_ELASTIC_CAPACITY: usize = 8;

/// Default deskew queue capacity (entries).
pub const DEFAULT_DESKEW_CAPACITY: usize = 16;

/// Default skew window bound (consumer ticks, counted from 1).
pub const DEFAULT_SKEW_BOUND: u8 = 4;

/// Producer-side fill estimates are corrected by the staleness of the synchronized read pointer.
pub const PIPELINE_DELAY: u32 = laneflow::SYNC_STAGES as u32;

/// K28.5 (COM) as sent at negative running disparity: `001111 1010`.
pub const COM_RDN: Symbol = 0b01_0111_1100;

/// K28.5 (COM) as sent at positive running disparity: `110000 0101`.
pub const COM_RDP: Symbol = 0b10_1000_0011;

/// Electrical idle.
pub const IDLE: Symbol = 0;

const_assert!(DEFAULT_ELASTIC_CAPACITY.is_power_of_two());
const_assert!(DEFAULT_ELASTIC_CAPACITY >= MIN_ELASTIC_CAPACITY);
const_assert!(DEFAULT_DESKEW_CAPACITY.is_power_of_two());
const_assert!(DEFAULT_SKEW_BOUND >= 2);
const_assert!(COM_RDN ^ COM_RDP == 0b11_1111_1111);
