//! Alignment controller: releases one entry from every lane in the same consumer tick.
//!
//! Each lane opens its deskew queue right after its first COM. Once every lane has seen that COM,
//! the skew window counter runs up to its bound; lanes whose COM arrives inside the window still
//! start their queue from the same group. After the window has elapsed, a tick on which every queue
//! has a head releases all heads together.

use arrayvec::ArrayVec;
use laneflow::{Fsm, SaturatingCounter};
use tracing::debug;

use crate::config::{ConfigError, LinkConfig};
use crate::constants::MAX_LANES;
use crate::lane::Lane;
use crate::types::Entry;

/// One entry per lane.
pub type Release = ArrayVec<Entry, MAX_LANES>;

/// Egress signal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlignerE {
    /// Heads released on this tick, indexed by lane.
    pub release: Option<Release>,
    /// Release gate.
    pub all_ready: bool,
}

/// Alignment controller over all lanes of a link.
#[derive(Debug)]
pub struct Aligner {
    lanes: Vec<Lane>,
    window: SaturatingCounter,
}

impl Aligner {
    /// Creates the lanes of `config`.
    pub fn new(config: &LinkConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let lanes = (0..config.lanes).map(|index| Lane::new(index, config)).collect::<Result<_, _>>()?;
        Ok(Self { lanes, window: SaturatingCounter::new(1, config.skew_bound) })
    }

    /// Lanes.
    pub fn lanes(&self) -> &[Lane] { &self.lanes }

    /// Lanes, for stepping their producer side.
    pub fn lanes_mut(&mut self) -> &mut [Lane] { &mut self.lanes }

    /// Lane `index`.
    pub fn lane_mut(&mut self, index: usize) -> Option<&mut Lane> { self.lanes.get_mut(index) }

    /// Skew window counter.
    pub fn window(&self) -> u8 { self.window.value() }

    /// Whether the skew window has elapsed.
    pub fn window_elapsed(&self) -> bool { self.window.is_saturated() }
}

impl Fsm for Aligner {
    type E = AlignerE;
    type I = ();

    fn tick(&mut self, _: ()) -> AlignerE {
        // Release gate, on the registered state.
        let all_ready = self.window.is_saturated() && self.lanes.iter().all(|lane| lane.deskew().not_empty());
        let release = if all_ready { self.lanes.iter_mut().map(Lane::release).collect::<Option<Release>>() } else { None };

        // Skew window.
        let window_open = !self.window.is_saturated();
        let all_seen = self.lanes.iter().all(Lane::marker_seen);
        self.window.step(all_seen);
        if window_open && self.window.is_saturated() {
            debug!(lanes = self.lanes.len(), "skew window elapsed");
        }

        for lane in &mut self.lanes {
            lane.tick_consumer(window_open);
        }

        AlignerE { release, all_ready }
    }

    fn reset(&mut self) {
        for lane in &mut self.lanes {
            lane.reset();
        }
        self.window.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::Transmitter;
    use crate::types::{Character, COM, SKP};

    fn aligner(lanes: usize) -> Aligner { Aligner::new(&LinkConfig::builder().lanes(lanes).build().unwrap()).unwrap() }

    /// Drives every lane at the consumer's symbol rate.
    fn step(aligner: &mut Aligner, transmitters: &mut [Transmitter]) -> AlignerE {
        for _ in 0..10 {
            for (lane, tx) in aligner.lanes_mut().iter_mut().zip(transmitters.iter_mut()) {
                if tx.pending() == 0 {
                    tx.send(SKP).unwrap();
                }
                lane.tick_producer(tx.next_bit());
            }
        }
        aligner.tick(())
    }

    #[test]
    fn rejects_invalid_config() {
        let config = LinkConfig { lanes: 0, ..LinkConfig::default() };
        assert_eq!(Aligner::new(&config).err(), Some(ConfigError::LaneCount(0)));
    }

    #[test]
    fn window_counts_up_and_holds() {
        let mut aligner = aligner(2);
        let mut transmitters = vec![Transmitter::default(), Transmitter::default()];
        transmitters[1].send_idle(25);
        for tx in &mut transmitters {
            tx.send(COM).unwrap();
            tx.send(Character::data(7)).unwrap();
        }

        let mut previous = aligner.window();
        let mut seen_bound = false;
        for _ in 0..60 {
            step(&mut aligner, &mut transmitters);
            let window = aligner.window();
            assert!(window >= previous);
            assert!(window <= 4);
            seen_bound |= window == 4;
            previous = window;
        }
        assert!(seen_bound);
        assert!(aligner.window_elapsed());
    }

    #[test]
    fn window_waits_for_every_lane() {
        let mut aligner = aligner(2);
        let mut transmitters = vec![Transmitter::default(), Transmitter::default()];
        transmitters[0].send(COM).unwrap();
        transmitters[0].send(Character::data(7)).unwrap();
        for _ in 0..40 {
            step(&mut aligner, &mut transmitters);
        }
        assert!(aligner.lanes()[0].marker_seen());
        assert!(!aligner.lanes()[1].marker_seen());
        assert_eq!(aligner.window(), 1);
    }

    #[test]
    fn releases_nothing_before_window() {
        let mut aligner = aligner(1);
        let mut transmitters = vec![Transmitter::default()];
        transmitters[0].send(COM).unwrap();
        for byte in 0..8 {
            transmitters[0].send(Character::data(byte)).unwrap();
        }
        let mut released = Vec::new();
        for _ in 0..40 {
            let out = step(&mut aligner, &mut transmitters);
            if let Some(release) = out.release {
                assert!(aligner.window_elapsed());
                released.push(release[0]);
            }
        }
        assert_eq!(released, (0..8).map(|b| Entry::valid(Character::data(b))).collect::<Vec<_>>());
    }

    #[test]
    fn minimum_skew_bound_releases() {
        let config = LinkConfig::builder().lanes(1).skew_bound(2).build().unwrap();
        let mut aligner = Aligner::new(&config).unwrap();
        let mut transmitters = vec![Transmitter::default()];
        transmitters[0].send(COM).unwrap();
        for byte in 0..8 {
            transmitters[0].send(Character::data(byte)).unwrap();
        }
        let released = (0..40).filter_map(|_| step(&mut aligner, &mut transmitters).release).map(|r| r[0]).collect::<Vec<_>>();
        assert_eq!(released, (0..8).map(|b| Entry::valid(Character::data(b))).collect::<Vec<_>>());
    }

    #[test]
    fn idle_run_is_not_replayed() {
        let mut aligner = aligner(1);
        let mut transmitters = vec![Transmitter::default()];
        // D.x.1 bytes end in `01` on the wire, so the idle zeros that follow cannot form a comma.
        let payload = (0x21..0x25).map(Character::data).collect::<Vec<_>>();
        transmitters[0].send(COM).unwrap();
        for c in &payload {
            transmitters[0].send(*c).unwrap();
        }
        transmitters[0].send_idle(30 * 10);

        let released = (0..80).filter_map(|_| step(&mut aligner, &mut transmitters).release).map(|r| r[0]).collect::<Vec<_>>();
        assert_eq!(released, payload.into_iter().map(Entry::valid).collect::<Vec<_>>());
        assert_eq!(aligner.lanes()[0].stats().decode_errors, 0);
    }

    #[test]
    fn reset_restarts_window() {
        let mut aligner = aligner(1);
        let mut transmitters = vec![Transmitter::default()];
        transmitters[0].send(COM).unwrap();
        for _ in 0..30 {
            step(&mut aligner, &mut transmitters);
        }
        assert!(aligner.window_elapsed());
        aligner.reset();
        assert_eq!(aligner.window(), 1);
        assert!(aligner.lanes().iter().all(|lane| lane.deskew().is_empty()));
    }
}
