//! Multi-lane 8b/10b receive pipeline.
//!
//! Per lane, recovered bits are framed into symbols, decoded with running disparity, passed through
//! a clock compensation buffer into the consumer clock domain, and queued for deskew. The
//! [`Aligner`] then releases one entry from every lane per consumer tick, all from the same
//! transmitted group.

// # Tries to deny all lints (`rustc -W help`).
#![deny(absolute_paths_not_starting_with_crate)]
#![deny(anonymous_parameters)]
#![deny(deprecated_in_future)]
#![deny(explicit_outlives_requirements)]
#![deny(keyword_idents)]
#![deny(macro_use_extern_crate)]
#![deny(non_ascii_idents)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_code)]
#![deny(unused_extern_crates)]
#![deny(unused_import_braces)]
//
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::bare_urls)]

pub mod aligner;
pub mod codec;
pub mod config;
pub mod constants;
pub mod deskew;
pub mod elastic;
pub mod framer;
pub mod lane;
pub mod testbench;
pub mod tx;
pub mod types;

pub use aligner::{Aligner, AlignerE, Release};
pub use codec::{CodecError, DecodeStage, Decoded, Decoder, Encoder};
pub use config::{ConfigError, LinkConfig};
pub use deskew::DeskewQueue;
pub use lane::{Lane, LaneE, LaneStats};
pub use testbench::{LaneDrive, Testbench, TestbenchError};
pub use tx::Transmitter;
pub use types::{Category, Character, Disparity, Entry, Symbol, COM, SKP};
