//! One receive lane: framer, decoder, compensation buffer and deskew queue.
//!
//! The lane straddles two clocks. [`Lane::tick_producer`] runs on the lane's recovered bit clock and
//! fills the compensation buffer; [`Lane::tick_consumer`] runs on the shared consumer clock, drains
//! it and feeds the deskew queue.

use laneflow::{FlagSynchronizer, Fsm};
use tracing::{debug, warn};

use crate::codec::{DecodeStage, Decoded};
use crate::config::{ConfigError, LinkConfig};
use crate::deskew::DeskewQueue;
use crate::elastic::{self, ConsumerE, Correction, ProducerE};
use crate::framer::{self, Framer};
use crate::types::Entry;

/// Per-lane counters, kept across resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaneStats {
    /// Symbols framed.
    pub symbols: u64,
    /// Symbols that failed to decode.
    pub decode_errors: u64,
    /// Filler entries inserted.
    pub inserted: u64,
    /// Filler entries removed.
    pub removed: u64,
    /// Decision points out of correction range.
    pub saturations: u64,
    /// Deskew writes dropped on a full queue.
    pub overflows: u64,
}

/// Producer-side egress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaneE {
    /// Decoder output, once per symbol time after framing.
    pub decoded: Option<Decoded>,
    /// Compensation correction applied on this tick.
    pub correction: Option<Correction>,
}

/// Receive lane.
#[derive(Debug)]
pub struct Lane {
    index: usize,
    framer: Framer,
    decode: DecodeStage,
    producer: elastic::Producer,
    consumer: elastic::Consumer,
    deskew: DeskewQueue,

    /// Producer side: the framer found its first comma.
    locked: bool,
    /// Consumer side: `locked`, synchronized.
    locked_sync: FlagSynchronizer,
    marker_seen: bool,

    stats: LaneStats,
}

impl Lane {
    /// Creates lane `index` of a link.
    pub fn new(index: usize, config: &LinkConfig) -> Result<Self, ConfigError> {
        let (producer, consumer) = elastic::channel(config.elastic_capacity)?;
        Ok(Self {
            index,
            framer: framer::new(),
            decode: DecodeStage::new(),
            producer,
            consumer,
            deskew: DeskewQueue::new(config.deskew_capacity)?,
            locked: false,
            locked_sync: FlagSynchronizer::new(false),
            marker_seen: false,
            stats: LaneStats::default(),
        })
    }

    /// Lane index.
    pub fn index(&self) -> usize { self.index }

    /// Counters.
    pub fn stats(&self) -> LaneStats { LaneStats { overflows: self.deskew.overflows(), ..self.stats } }

    /// Whether this lane has seen a COM that is not part of a filler ordered set.
    pub fn marker_seen(&self) -> bool { self.marker_seen }

    /// Deskew queue.
    pub fn deskew(&self) -> &DeskewQueue { &self.deskew }

    /// One tick of the lane's bit clock. `bit` is `None` when no valid bit was recovered.
    pub fn tick_producer(&mut self, bit: Option<bool>) -> LaneE {
        let framed = self.framer.tick(bit);
        if framed.symbol.is_some() {
            self.stats.symbols += 1;
        }
        if framed.frame_align && !self.locked {
            debug!(lane = self.index, "symbol lock");
            self.locked = true;
        }

        // Every decoded symbol writes one entry. Idle symbols become filler so the write side keeps
        // pace with the read side.
        let decoded = self.decode.tick(framed.symbol);
        let entry = decoded.map(|decoded| {
            if decoded.error {
                self.stats.decode_errors += 1;
                warn!(lane = self.index, "decode error");
                Entry::invalid()
            } else {
                decoded.character.map_or(Entry::skp(), Entry::valid)
            }
        });

        // The compensation buffer's write side runs on the symbol clock derived by the framer.
        let out = if framed.symbol.is_some() { self.producer.tick(entry) } else { ProducerE::default() };
        match out.correction {
            Some(Correction::Insert(n)) => self.stats.inserted += u64::from(n),
            Some(Correction::Remove) => self.stats.removed += 1,
            None => (),
        }
        if out.saturated {
            self.stats.saturations += 1;
        }

        LaneE { decoded, correction: out.correction }
    }

    /// One tick of the consumer clock.
    ///
    /// Reads one entry once symbol lock has crossed into the consumer domain, and stores it in the
    /// deskew queue. The first COM that is not part of a filler ordered set sets
    /// [`Lane::marker_seen`] and, while `window_open`, opens the deskew queue for the entries that
    /// follow.
    pub fn tick_consumer(&mut self, window_open: bool) -> Option<ConsumerE> {
        let enable = self.locked_sync.output();
        self.locked_sync.sample(self.locked);

        let out = self.consumer.tick(enable)?;
        self.deskew.try_write(out.entry, out.filler_set);

        if out.entry.is_com() && !out.filler_set {
            if !self.marker_seen {
                debug!(lane = self.index, fill = out.fill, "first marker");
                self.marker_seen = true;
            }
            if window_open && !self.deskew.is_open() {
                self.deskew.open();
            }
        }
        Some(out)
    }

    /// Head of the deskew queue, released.
    pub(crate) fn release(&mut self) -> Option<Entry> {
        let head = self.deskew.peek_head()?;
        self.deskew.advance_on_release();
        Some(head)
    }

    /// Returns every stage to its reset state. Counters are kept.
    pub fn reset(&mut self) {
        self.framer.reset();
        self.decode.reset();
        self.producer.reset();
        self.consumer.reset();
        self.deskew.reset();
        self.locked = false;
        self.locked_sync.reset(false);
        self.marker_seen = false;
    }
}
