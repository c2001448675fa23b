//! Symbol framing: recovers 10-bit symbol boundaries from the bit stream by comma detection, and
//! derives the symbol strobe from the bit clock.

use laneflow::FsmMap;

use crate::constants::SYMBOL_BITS;
use crate::types::Symbol;

/// Egress signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct E {
    /// A complete symbol, once per symbol time after alignment.
    pub symbol: Option<Symbol>,
    /// A comma was found in the shift register on this tick.
    pub frame_align: bool,
}

/// Registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct S {
    shift_reg: Symbol,
    frame_counter: u8,
    locked: bool,
}

/// Framer: one tick per received bit (`None` when the bit is not valid).
pub type Framer = FsmMap<S, Option<bool>, E>;

/// Creates a framer that has not yet seen a comma.
pub fn new() -> Framer { FsmMap::new(S::default(), logic) }

/// Seven-bit comma `0011111`, first bit in bit 0.
const COMMA_RDN: Symbol = 0b111_1100;
/// Seven-bit comma `1100000`.
const COMMA_RDP: Symbol = 0b000_0011;

fn logic(input: Option<bool>, state: &S) -> (E, S) {
    let Some(bit) = input else {
        return (E::default(), *state);
    };

    // Input shift register: bits enter at the top so the first bit of a symbol ends up in bit 0.
    let shift_reg_next = (state.shift_reg >> 1) | (Symbol::from(bit) << (SYMBOL_BITS - 1));

    // Comma code detection and frame alignment
    let comma = state.shift_reg & 0x7f;
    let frame_align = comma == COMMA_RDN || comma == COMMA_RDP;

    // Frame counter
    let last = (SYMBOL_BITS - 1) as u8;
    let frame_recv = state.locked && state.frame_counter == last;
    let emit = frame_align || frame_recv;
    let frame_counter_next = if emit || state.frame_counter == last { 0 } else { state.frame_counter + 1 };

    let output = E { symbol: emit.then_some(state.shift_reg), frame_align };
    let state_next = S { shift_reg: shift_reg_next, frame_counter: frame_counter_next, locked: state.locked || frame_align };

    (output, state_next)
}
