//! Transmit side: encoder and serializer used to drive a receiver.

use std::collections::VecDeque;

use crate::codec::{CodecError, Encoder};
use crate::constants::SYMBOL_BITS;
use crate::types::{Character, Disparity, Symbol, COM, SKP};

/// Filler ordered set.
pub const SKIP_SET: [Character; 4] = [COM, SKP, SKP, SKP];

/// Bits of `symbol` in wire order (bit 0 first).
pub fn serialize(symbol: Symbol) -> impl Iterator<Item = bool> { (0..SYMBOL_BITS).map(move |i| (symbol >> i) & 1 == 1) }

/// Encoder plus serializer.
///
/// Optionally inserts a [`SKIP_SET`] before every `skp_interval`-th character, the way a
/// transmitter schedules rate compensation.
#[derive(Debug, Clone, Default)]
pub struct Transmitter {
    encoder: Encoder,
    skp_interval: Option<usize>,
    since_skip: usize,
    bits: VecDeque<bool>,
}

impl Transmitter {
    /// Creates a transmitter starting at `disparity`.
    pub fn new(disparity: Disparity) -> Self { Self { encoder: Encoder::new(disparity), ..Self::default() } }

    /// Inserts a filler ordered set after every `interval` characters.
    pub fn with_skp_interval(mut self, interval: usize) -> Self {
        self.skp_interval = (interval > 0).then_some(interval);
        self
    }

    /// Queues one character.
    pub fn send(&mut self, character: Character) -> Result<(), CodecError> {
        if let Some(interval) = self.skp_interval {
            if self.since_skip == interval {
                self.send_skip_set()?;
            }
        }
        self.since_skip += 1;
        self.send_encoded(character)
    }

    /// Queues a filler ordered set now.
    pub fn send_skip_set(&mut self) -> Result<(), CodecError> {
        self.since_skip = 0;
        SKIP_SET.iter().try_for_each(|c| self.send_encoded(*c))
    }

    /// Queues a raw symbol, bypassing the encoder.
    pub fn send_symbol(&mut self, symbol: Symbol) { self.bits.extend(serialize(symbol)); }

    /// Queues `count` zero bits.
    pub fn send_idle(&mut self, count: usize) { self.bits.extend(std::iter::repeat(false).take(count)); }

    /// Bits queued but not yet sent.
    pub fn pending(&self) -> usize { self.bits.len() }

    /// Next bit on the wire.
    pub fn next_bit(&mut self) -> Option<bool> { self.bits.pop_front() }

    fn send_encoded(&mut self, character: Character) -> Result<(), CodecError> {
        let symbol = self.encoder.encode(character)?;
        self.send_symbol(symbol);
        Ok(())
    }
}
