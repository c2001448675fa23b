//! LaneFlow: tick-driven primitives for modelling clocked pipelines in software.
//!
//! Every component is a Mealy machine ([`Fsm`]) that is stepped once per tick of the clock domain
//! it lives in. Values only cross between clock domains through Gray-coded pointers sampled by a
//! [`Synchronizer`], the same way a two-flop synchronizer moves a FIFO pointer across clocks.

// # Tries to deny all lints (`rustc -W help`).
#![deny(absolute_paths_not_starting_with_crate)]
#![deny(anonymous_parameters)]
#![deny(deprecated_in_future)]
#![deny(explicit_outlives_requirements)]
#![deny(keyword_idents)]
#![deny(macro_use_extern_crate)]
#![deny(non_ascii_idents)]
#![deny(rust_2018_idioms)]
#![deny(trivial_numeric_casts)]
#![deny(unsafe_code)]
#![deny(unused_extern_crates)]
#![deny(unused_import_braces)]
//
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::bare_urls)]

pub mod clock;
mod counter;
mod fsm;
pub mod gray;
mod sync;

pub use clock::{ClockDomain, ClockError, Scheduler};
pub use counter::{Pointer, SaturatingCounter};
pub use fsm::{Fsm, FsmMap};
pub use sync::{FlagSynchronizer, GrayCell, Synchronizer, SYNC_STAGES};
