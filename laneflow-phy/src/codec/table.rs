//! Lookup tables, one per running disparity.
//!
//! Generated once from the combinational encoder: for every character that has a code word, the
//! encoder's output under each disparity becomes an entry of that disparity's decode table, and the
//! inverse is kept for encoding.

use std::sync::OnceLock;

use super::logic;
use crate::types::{Category, Character, Disparity, Symbol};

const SYMBOLS: usize = 1 << crate::constants::SYMBOL_BITS;

/// Encode and decode tables for both disparities.
pub(crate) struct Tables {
    encode: [[[Option<Symbol>; 256]; 2]; 2],
    decode: [[Option<Character>; SYMBOLS]; 2],
}

static TABLES: OnceLock<Tables> = OnceLock::new();

/// Shared tables, built on first use.
pub(crate) fn tables() -> &'static Tables { TABLES.get_or_init(Tables::build) }

fn category_index(category: Category) -> usize {
    match category {
        Category::Data => 0,
        Category::Control => 1,
    }
}

impl Tables {
    fn build() -> Self {
        let mut encode = [[[None; 256]; 2]; 2];
        let mut decode = [[None; SYMBOLS]; 2];

        for disparity in [Disparity::Negative, Disparity::Positive] {
            for category in [Category::Data, Category::Control] {
                for byte in 0..=u8::MAX {
                    let out = logic::encode(byte, category == Category::Control, disparity.rd());
                    if out.kerr {
                        continue;
                    }
                    encode[disparity.index()][category_index(category)][usize::from(byte)] = Some(out.symbol);
                    decode[disparity.index()][usize::from(out.symbol)] = Some(Character { byte, category });
                }
            }
        }

        Self { encode, decode }
    }

    /// Code word for `character` at `disparity`, if it has one.
    pub(crate) fn encode(&self, character: Character, disparity: Disparity) -> Option<Symbol> {
        self.encode[disparity.index()][category_index(character.category)][usize::from(character.byte)]
    }

    /// Character for `symbol` at `disparity`, if the code word is valid there.
    pub(crate) fn decode(&self, symbol: Symbol, disparity: Disparity) -> Option<Character> {
        self.decode[disparity.index()].get(usize::from(symbol)).copied().flatten()
    }

    /// Every valid `(symbol, character)` pair at `disparity`.
    pub(crate) fn code_words(&self, disparity: Disparity) -> impl Iterator<Item = (Symbol, Character)> + '_ {
        self.decode[disparity.index()]
            .iter()
            .enumerate()
            .filter_map(|(symbol, character)| character.map(|character| (symbol as Symbol, character)))
    }
}
