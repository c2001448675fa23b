//! Values carried through the pipeline.

use std::fmt;

/// A 10-bit channel symbol. Bit 0 is the first bit on the wire (`a`); bits 0..=5 are `abcdei` and
/// bits 6..=9 are `fghj`.
pub type Symbol = u16;

/// Running disparity in effect before the next symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disparity {
    /// More zeros than ones sent so far (RD-).
    Negative,
    /// More ones than zeros sent so far (RD+).
    Positive,
}

impl Disparity {
    /// The opposite disparity.
    pub fn flip(self) -> Self {
        match self {
            Self::Negative => Self::Positive,
            Self::Positive => Self::Negative,
        }
    }

    /// Disparity from the `rd` wire of the combinational coder (`true` is RD+).
    pub fn from_rd(rd: bool) -> Self { if rd { Self::Positive } else { Self::Negative } }

    /// The `rd` wire value.
    pub fn rd(self) -> bool { self == Self::Positive }

    /// Table index.
    pub(crate) fn index(self) -> usize { usize::from(self.rd()) }
}

/// Payload versus control character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// `D.x.y`
    Data,
    /// `K.x.y`
    Control,
}

/// A decoded byte together with its category.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Character {
    /// Payload byte.
    pub byte: u8,
    /// Data or control.
    pub category: Category,
}

impl Character {
    /// Data character.
    pub const fn data(byte: u8) -> Self { Self { byte, category: Category::Data } }

    /// Control character.
    pub const fn control(byte: u8) -> Self { Self { byte, category: Category::Control } }

    /// Whether this is a control character.
    pub fn is_control(self) -> bool { self.category == Category::Control }
}

impl fmt::Debug for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // D.x.y / K.x.y naming
        let prefix = if self.is_control() { 'K' } else { 'D' };
        write!(f, "{}{}.{}", prefix, self.byte & 0x1f, self.byte >> 5)
    }
}

/// Synchronization marker (K28.5).
pub const COM: Character = Character::control(0xbc);

/// Filler marker (K28.0).
pub const SKP: Character = Character::control(0x1c);

/// A buffer slot: a character and whether it decoded cleanly.
///
/// Entries that failed to decode still travel through the buffers so every lane keeps the same
/// number of entries per transmitted group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entry {
    /// Decoded character; meaningless when `valid` is clear.
    pub character: Character,
    /// Per-byte validity.
    pub valid: bool,
}

impl Entry {
    /// Cleanly decoded entry.
    pub const fn valid(character: Character) -> Self { Self { character, valid: true } }

    /// Placeholder for a symbol that failed to decode.
    pub const fn invalid() -> Self { Self { character: Character::data(0), valid: false } }

    /// Filler entry.
    pub const fn skp() -> Self { Self::valid(SKP) }

    /// Whether this entry is a valid COM.
    pub fn is_com(self) -> bool { self.valid && self.character == COM }

    /// Whether this entry is a valid SKP.
    pub fn is_skp(self) -> bool { self.valid && self.character == SKP }

    /// Packs into 10 bits: byte, control flag, valid flag.
    pub(crate) fn pack(self) -> u16 {
        u16::from(self.character.byte)
            | (u16::from(self.character.is_control()) << 8)
            | (u16::from(self.valid) << 9)
    }

    /// Inverse of [`Entry::pack`].
    pub(crate) fn unpack(bits: u16) -> Self {
        let byte = (bits & 0xff) as u8;
        let category = if bits & (1 << 8) != 0 { Category::Control } else { Category::Data };
        Self { character: Character { byte, category }, valid: bits & (1 << 9) != 0 }
    }
}
