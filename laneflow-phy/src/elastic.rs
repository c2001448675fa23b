//! Clock compensation (elastic) buffer.
//!
//! A ring of slots between a producer and a consumer that tick on unrelated clocks. The producer
//! keeps the fill level near half capacity by inserting or removing filler entries, but only inside
//! filler ordered sets (COM SKP SKP SKP), so payload is never touched.
//!
//! The two halves share nothing but the slots and the two Gray-coded pointers. Each pointer is
//! stored only by its owner and reaches the other side through a [`Synchronizer`], so every
//! decision is taken on a copy that is [`PIPELINE_DELAY`] ticks old and at most one off.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use arrayvec::ArrayVec;
use laneflow::{Fsm, GrayCell, Pointer, Synchronizer};
use tracing::{debug, trace, warn};

use crate::config::{validate_elastic_capacity, ConfigError};
use crate::constants::PIPELINE_DELAY;
use crate::types::Entry;

/// Fill distance from target beyond which one decision point cannot recover.
const CORRECTION_REACH: usize = 2;

#[derive(Debug)]
struct Shared {
    slots: Box<[AtomicU16]>,
    wptr: GrayCell,
    rptr: GrayCell,
}

impl Shared {
    fn capacity(&self) -> usize { self.slots.len() }

    fn initial_wptr(&self) -> u32 { (self.capacity() / 2) as u32 - PIPELINE_DELAY }
}

/// Creates a compensation buffer with `capacity` slots, in its reset state.
pub fn channel(capacity: usize) -> Result<(Producer, Consumer), ConfigError> {
    validate_elastic_capacity(capacity)?;

    let slots = (0..capacity).map(|_| AtomicU16::new(Entry::skp().pack())).collect();
    let shared = Arc::new(Shared { slots, wptr: GrayCell::new(0), rptr: GrayCell::new(0) });
    let wptr = shared.initial_wptr();
    shared.wptr.publish(wptr);

    let producer = Producer {
        wptr: Pointer::new(capacity, wptr),
        rptr_sync: Synchronizer::new(0),
        state: State::Idle,
        shared: shared.clone(),
    };
    let consumer = Consumer { rptr: Pointer::new(capacity, 0), wptr_sync: Synchronizer::new(wptr), shared };
    Ok((producer, consumer))
}

/// Fill correction applied at a decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// Filler entries written after the incoming one.
    Insert(u8),
    /// The incoming filler was not written.
    Remove,
}

/// Producer egress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProducerE {
    /// Correction applied on this tick.
    pub correction: Option<Correction>,
    /// Fill estimate, on decision ticks only.
    pub fill: Option<usize>,
    /// The estimate was further from target than one decision can correct.
    pub saturated: bool,
}

/// Ordered-set detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    FirstMarker,
    OrderedSet,
    RemovalPending,
}

/// Write half. Ticks on the producer clock.
#[derive(Debug)]
pub struct Producer {
    shared: Arc<Shared>,
    wptr: Pointer,
    rptr_sync: Synchronizer,
    state: State,
}

impl Producer {
    /// Number of slots.
    pub fn capacity(&self) -> usize { self.shared.capacity() }

    /// Fill level the corrections steer towards.
    pub fn target(&self) -> usize { self.capacity() / 2 }

    /// Fill estimate from the synchronized read pointer, corrected for its staleness.
    pub fn fill_estimate(&self) -> usize {
        self.wptr.distance_from(self.rptr_sync.output().wrapping_add(PIPELINE_DELAY))
    }

    fn write(&mut self, entry: Entry) {
        self.shared.slots[self.wptr.slot()].store(entry.pack(), Ordering::Release);
        self.wptr.advance(1);
    }

    fn decide(&self, entry: Entry, writes: &mut ArrayVec<Entry, 3>, output: &mut ProducerE) -> State {
        let fill = self.fill_estimate();
        let target = self.target();
        output.fill = Some(fill);

        if fill.abs_diff(target) > CORRECTION_REACH {
            output.saturated = true;
            warn!(fill, target, "compensation buffer out of correction range");
        }

        match fill.cmp(&target) {
            std::cmp::Ordering::Less => {
                let inserts = if fill + 1 < target { 2 } else { 1 };
                writes.push(entry);
                for _ in 0..inserts {
                    writes.push(Entry::skp());
                }
                output.correction = Some(Correction::Insert(inserts));
                State::Idle
            }
            std::cmp::Ordering::Equal => {
                writes.push(entry);
                State::Idle
            }
            std::cmp::Ordering::Greater => {
                output.correction = Some(Correction::Remove);
                if fill == target + 1 {
                    State::Idle
                } else {
                    State::RemovalPending
                }
            }
        }
    }
}

impl Fsm for Producer {
    type E = ProducerE;
    type I = Option<Entry>;

    fn tick(&mut self, input: Option<Entry>) -> ProducerE {
        let mut output = ProducerE::default();

        if let Some(entry) = input {
            let mut writes = ArrayVec::<Entry, 3>::new();
            let state_next = match self.state {
                State::Idle => {
                    writes.push(entry);
                    if entry.is_com() {
                        State::FirstMarker
                    } else {
                        State::Idle
                    }
                }
                State::FirstMarker => {
                    writes.push(entry);
                    if entry.is_skp() {
                        State::OrderedSet
                    } else {
                        State::Idle
                    }
                }
                State::OrderedSet => self.decide(entry, &mut writes, &mut output),
                State::RemovalPending => {
                    output.correction = Some(Correction::Remove);
                    State::Idle
                }
            };

            if let Some(correction) = output.correction {
                debug!(?correction, fill = ?output.fill, "fill correction");
            }
            for entry in &writes {
                self.write(*entry);
            }
            if !writes.is_empty() {
                self.shared.wptr.publish(self.wptr.value());
            }
            self.state = state_next;
        }

        // The read pointer is sampled on every producer clock edge, enabled or not.
        self.rptr_sync.sample(self.shared.rptr.load_gray());
        output
    }

    fn reset(&mut self) {
        for slot in self.shared.slots.iter() {
            slot.store(Entry::skp().pack(), Ordering::Release);
        }
        let wptr = self.shared.initial_wptr();
        self.wptr = Pointer::new(self.capacity(), wptr);
        self.shared.wptr.publish(wptr);
        self.rptr_sync.reset(0);
        self.state = State::Idle;
    }
}

/// Consumer egress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerE {
    /// Entry at the read pointer.
    pub entry: Entry,
    /// `entry` is the COM of a filler ordered set (the next slot holds SKP).
    pub filler_set: bool,
    /// Occupancy seen through the synchronized write pointer.
    pub fill: usize,
}

/// Read half. Ticks on the consumer clock.
#[derive(Debug)]
pub struct Consumer {
    shared: Arc<Shared>,
    rptr: Pointer,
    wptr_sync: Synchronizer,
}

impl Consumer {
    /// Number of slots.
    pub fn capacity(&self) -> usize { self.shared.capacity() }

    /// Occupancy from the synchronized write pointer. For monitoring only.
    pub fn fill(&self) -> usize { Pointer::new(self.capacity(), self.wptr_sync.output()).distance_from(self.rptr.value()) }

    fn load(&self, slot: usize) -> Entry { Entry::unpack(self.shared.slots[slot].load(Ordering::Acquire)) }
}

impl Fsm for Consumer {
    type E = Option<ConsumerE>;
    type I = bool;

    fn tick(&mut self, enable: bool) -> Option<ConsumerE> {
        let fill = self.fill();
        self.wptr_sync.sample(self.shared.wptr.load_gray());
        if !enable {
            return None;
        }

        let entry = self.load(self.rptr.slot());
        let next = self.load(self.rptr.slot_ahead(1));
        let filler_set = entry.is_com() && next.is_skp();
        trace!(slot = self.rptr.slot(), ?entry, filler_set, "read");

        self.rptr.advance(1);
        self.shared.rptr.publish(self.rptr.value());

        Some(ConsumerE { entry, filler_set, fill })
    }

    fn reset(&mut self) {
        self.rptr = Pointer::new(self.capacity(), 0);
        self.shared.rptr.publish(0);
        self.wptr_sync.reset(self.shared.initial_wptr());
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::types::{Character, COM, SKP};

    const SKIP_SET: [Entry; 4] = [Entry::valid(COM), Entry::skp(), Entry::skp(), Entry::skp()];

    fn data(byte: u8) -> Entry { Entry::valid(Character::data(byte)) }

    /// Both halves stepped in lockstep: producer edge first, then consumer edge.
    struct Harness {
        producer: Producer,
        consumer: Consumer,
        decisions: Vec<ProducerE>,
        read: Vec<ConsumerE>,
    }

    impl Harness {
        fn new(capacity: usize) -> Self {
            let (producer, consumer) = channel(capacity).unwrap();
            Self { producer, consumer, decisions: Vec::new(), read: Vec::new() }
        }

        fn step(&mut self, input: Option<Entry>, consume: bool) {
            let out = self.producer.tick(input);
            if out.fill.is_some() || out.correction.is_some() {
                self.decisions.push(out);
            }
            self.read.extend(self.consumer.tick(consume));
        }

        fn feed(&mut self, entries: &[Entry]) {
            for entry in entries {
                self.step(Some(*entry), true);
            }
        }

        fn read_data(&self) -> Vec<Entry> { self.read.iter().map(|out| out.entry).filter(|e| !e.character.is_control()).collect() }
    }

    #[test]
    fn rejects_bad_capacity() {
        assert_eq!(channel(12).err(), Some(ConfigError::ElasticCapacity(12)));
        assert_eq!(channel(4).err(), Some(ConfigError::ElasticCapacity(4)));
    }

    #[test]
    fn reset_state() {
        let (mut producer, mut consumer) = channel(16).unwrap();
        assert_eq!(producer.wptr.value(), 6);
        assert_eq!(consumer.rptr.value(), 0);
        assert_eq!(consumer.fill(), 6);

        producer.tick(Some(data(1)));
        consumer.tick(true);
        producer.reset();
        consumer.reset();

        assert_eq!(producer.wptr.value(), 6);
        for _ in 0..16 {
            let out = consumer.tick(true).unwrap();
            assert!(out.entry.is_skp());
            assert!(!out.filler_set);
        }
    }

    #[test]
    fn fill_estimate_accounts_for_pointer_delay() {
        let mut harness = Harness::new(16);
        harness.feed(&[data(0), data(1), data(2), data(3)]);
        // In lockstep the estimate settles at the real distance.
        assert_eq!(harness.producer.fill_estimate(), 6);
    }

    #[test]
    fn target_plus_one_removes_once() {
        let mut harness = Harness::new(16);

        // Settle at target.
        harness.feed(&[data(0), data(1), data(2), data(3)]);
        harness.feed(&SKIP_SET);
        harness.feed(&[data(4), data(5)]);

        // One consumer stall pushes the fill to target+1.
        harness.step(Some(data(6)), false);
        harness.feed(&[data(7), data(8), data(9)]);
        harness.feed(&SKIP_SET);
        harness.feed(&[data(10), data(11), data(12)]);
        harness.feed(&SKIP_SET);

        let corrections = harness.decisions.iter().map(|d| (d.fill, d.correction)).collect::<Vec<_>>();
        assert_eq!(corrections, [
            (Some(6), Some(Correction::Insert(2))),
            (Some(9), Some(Correction::Remove)),
            (Some(8), None),
        ]);
    }

    #[test]
    fn far_above_target_removes_twice() {
        let mut harness = Harness::new(16);
        harness.feed(&[data(0), data(1), data(2), data(3)]);
        harness.feed(&SKIP_SET);
        harness.feed(&[data(4)]);

        harness.step(Some(data(5)), false);
        harness.step(Some(data(6)), false);
        harness.feed(&[data(7), data(8), data(9)]);
        harness.feed(&SKIP_SET);
        harness.feed(&[data(10), data(11), data(12)]);
        harness.feed(&SKIP_SET);

        let corrections = harness.decisions.iter().map(|d| (d.fill, d.correction)).collect::<Vec<_>>();
        assert_eq!(corrections, [
            (Some(6), Some(Correction::Insert(2))),
            (Some(10), Some(Correction::Remove)),
            (None, Some(Correction::Remove)),
            (Some(8), None),
        ]);
    }

    #[test]
    fn target_minus_one_inserts_once() {
        let mut harness = Harness::new(16);
        harness.feed(&[data(0), data(1), data(2), data(3)]);
        harness.feed(&SKIP_SET);
        harness.feed(&[data(4)]);

        // One producer gap drops the fill to target-1.
        harness.step(None, true);
        harness.feed(&[data(5), data(6), data(7)]);
        harness.feed(&SKIP_SET);

        let corrections = harness.decisions.iter().map(|d| (d.fill, d.correction)).collect::<Vec<_>>();
        assert_eq!(corrections, [(Some(6), Some(Correction::Insert(2))), (Some(7), Some(Correction::Insert(1)))]);
    }

    #[test]
    fn filler_set_flags_com_followed_by_skp() {
        let mut harness = Harness::new(16);
        harness.feed(&[Entry::valid(COM), data(1), data(2)]);
        harness.feed(&SKIP_SET);
        harness.feed(&[data(3); 16]);
        let coms = harness.read.iter().filter(|out| out.entry.is_com()).map(|out| out.filler_set).collect::<Vec<_>>();
        assert_eq!(coms, [false, true]);
    }

    #[test]
    fn skp_is_never_mistaken_for_data() {
        let mut harness = Harness::new(16);
        harness.feed(&[Entry::valid(SKP), data(0xbc), Entry::valid(Character::data(0x1c))]);
        harness.feed(&[data(0); 12]);
        assert!(harness.decisions.is_empty());
    }

    #[derive(Debug, Clone, Copy)]
    enum Drift {
        None,
        ConsumerStall(usize),
        ProducerGap(usize),
    }

    fn any_group() -> impl Strategy<Value = (usize, Drift)> {
        (0..4usize).prop_flat_map(|payload| {
            let len = payload + SKIP_SET.len();
            let drift = prop_oneof![
                Just(Drift::None),
                (0..len).prop_map(Drift::ConsumerStall),
                (0..len).prop_map(Drift::ProducerGap),
            ];
            (Just(payload), drift)
        })
    }

    macro_rules! drift_band_test {
        ($($capacity:literal),*) => {
            paste::paste! {
                proptest! {
                    $(
                        #[test]
                        fn [<prop_fill_stays_in_band_ $capacity>](groups in prop::collection::vec(any_group(), 1..60)) {
                            check_band($capacity, &groups)?;
                        }
                    )*
                }
            }
        };
    }

    drift_band_test!(16, 32, 64);

    fn check_band(capacity: usize, groups: &[(usize, Drift)]) -> Result<(), TestCaseError> {
        let mut harness = Harness::new(capacity);
        let mut sent = Vec::new();
        let mut next = 0u8;

        // One clean ordered set centers the buffer before drift starts.
        harness.feed(&SKIP_SET);
        for &(payload, drift) in groups {
            let group = (0..payload)
                .map(|_| {
                    let entry = data(next);
                    next = next.wrapping_add(1);
                    entry
                })
                .collect::<Vec<_>>();
            sent.extend_from_slice(&group);
            for (i, entry) in SKIP_SET.iter().chain(&group).enumerate() {
                match drift {
                    Drift::ConsumerStall(at) if at == i => harness.step(Some(*entry), false),
                    Drift::ProducerGap(at) if at == i => {
                        harness.step(None, true);
                        harness.step(Some(*entry), true);
                    }
                    _ => harness.step(Some(*entry), true),
                }
            }
        }
        // Drain.
        harness.feed(&[Entry::skp(); 64]);

        let target = capacity / 2;
        for decision in &harness.decisions {
            if let Some(fill) = decision.fill {
                prop_assert!(fill.abs_diff(target) <= CORRECTION_REACH, "fill {} target {}", fill, target);
                let after = match decision.correction {
                    Some(Correction::Insert(n)) => fill + usize::from(n),
                    Some(Correction::Remove) => fill - 1,
                    None => fill,
                };
                prop_assert!(after.abs_diff(target) <= 1);
                prop_assert!(!decision.saturated);
            }
        }
        prop_assert_eq!(harness.read_data(), sent);
        Ok(())
    }
}
