//! 8b/10b symbol codec with running disparity.

mod logic;
mod table;

use laneflow::Fsm;
use thiserror::Error;
use tracing::{debug, trace};

use crate::constants::{COM_RDN, COM_RDP, IDLE};
use crate::types::{Character, Disparity, Symbol, COM};

/// Codec error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// The control byte has no K code word.
    #[error("control byte {0:#04x} has no code word")]
    InvalidControl(u8),
}

/// Whether receiving (or sending) `symbol` flips the running disparity.
///
/// Balanced words (odd population count over 10 bits means five ones) and electrical idle leave it
/// unchanged.
pub(crate) fn flips_disparity(symbol: Symbol) -> bool { symbol != IDLE && symbol.count_ones() % 2 == 0 }

/// Result of decoding one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    /// Decoded character; `None` when the symbol is invalid, idle, or disparity is not yet known.
    pub character: Option<Character>,
    /// The symbol matched no code word under the active disparity.
    pub error: bool,
}

impl Decoded {
    fn valid(character: Character) -> Self { Self { character: Some(character), error: false } }

    fn withheld() -> Self { Self { character: None, error: false } }

    fn error() -> Self { Self { character: None, error: true } }
}

/// Receive-side codec state: the running disparity expected before the next symbol.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    disparity: Option<Disparity>,
}

impl Decoder {
    /// Creates a decoder that still has to see a comma.
    pub fn new() -> Self { Self::default() }

    /// Creates a decoder already seeded with `disparity`.
    pub fn seeded(disparity: Disparity) -> Self { Self { disparity: Some(disparity) } }

    /// Running disparity, once known.
    pub fn disparity(&self) -> Option<Disparity> { self.disparity }

    /// Decodes one symbol and updates the running disparity.
    pub fn decode(&mut self, symbol: Symbol) -> Decoded {
        // Either form of COM pins the disparity, whatever was tracked before.
        let seed = match symbol {
            COM_RDN => Some(Disparity::Positive),
            COM_RDP => Some(Disparity::Negative),
            _ => None,
        };
        if let Some(seed) = seed {
            if self.disparity.is_none() {
                debug!(?seed, "disparity seeded from comma");
            }
            self.disparity = Some(seed);
            return Decoded::valid(COM);
        }

        let Some(disparity) = self.disparity else {
            return Decoded::withheld();
        };
        if symbol == IDLE {
            return Decoded::withheld();
        }

        match table::tables().decode(symbol, disparity) {
            Some(character) => {
                if flips_disparity(symbol) {
                    self.disparity = Some(disparity.flip());
                }
                Decoded::valid(character)
            }
            None => {
                trace!(symbol = format_args!("{:010b}", symbol), ?disparity, "code violation");
                Decoded::error()
            }
        }
    }

    /// Forgets the running disparity.
    pub fn reset(&mut self) { self.disparity = None; }
}

/// Pipelined decoder with one enabled tick of lookup latency.
///
/// The symbol presented on enabled tick `n` is looked up on enabled tick `n + 1`, using the
/// disparity left behind by symbol `n - 1`. Ticks without a symbol hold every register.
#[derive(Debug, Clone, Default)]
pub struct DecodeStage {
    decoder: Decoder,
    latched: Option<Symbol>,
}

impl DecodeStage {
    /// Creates an unseeded stage.
    pub fn new() -> Self { Self::default() }

    /// Running disparity, once known.
    pub fn disparity(&self) -> Option<Disparity> { self.decoder.disparity() }
}

impl Fsm for DecodeStage {
    type E = Option<Decoded>;
    type I = Option<Symbol>;

    fn tick(&mut self, input: Option<Symbol>) -> Option<Decoded> {
        let symbol = input?;
        let output = self.latched.map(|latched| self.decoder.decode(latched));
        self.latched = Some(symbol);
        output
    }

    fn reset(&mut self) {
        self.decoder.reset();
        self.latched = None;
    }
}

/// Transmit-side codec state.
#[derive(Debug, Clone)]
pub struct Encoder {
    disparity: Disparity,
}

impl Default for Encoder {
    fn default() -> Self { Self::new(Disparity::Negative) }
}

impl Encoder {
    /// Creates an encoder starting at `disparity`.
    pub fn new(disparity: Disparity) -> Self { Self { disparity } }

    /// Running disparity before the next symbol.
    pub fn disparity(&self) -> Disparity { self.disparity }

    /// Encodes one character and updates the running disparity.
    pub fn encode(&mut self, character: Character) -> Result<Symbol, CodecError> {
        let symbol = table::tables()
            .encode(character, self.disparity)
            .ok_or(CodecError::InvalidControl(character.byte))?;
        if flips_disparity(symbol) {
            self.disparity = self.disparity.flip();
        }
        Ok(symbol)
    }
}
