//! Simulated link: one transmitter and bit clock per lane plus the shared consumer clock, stepped in
//! virtual time.
//!
//! A transmitter that runs out of characters keeps the line busy with lone SKPs.

use laneflow::{ClockDomain, ClockError, Fsm, Scheduler};
use thiserror::Error;
use tracing::trace;

use crate::aligner::{Aligner, Release};
use crate::codec::CodecError;
use crate::config::{ConfigError, LinkConfig};
use crate::constants::SYMBOL_BITS;
use crate::tx::Transmitter;
use crate::types::SKP;

/// Testbench error.
#[derive(Debug, Error)]
pub enum TestbenchError {
    /// Invalid link configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Invalid clock.
    #[error(transparent)]
    Clock(#[from] ClockError),
    /// Transmitter failed to encode.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Not one drive per lane.
    #[error("{drives} lane drives for {lanes} lanes")]
    LaneCount {
        /// Drives given.
        drives: usize,
        /// Lanes configured.
        lanes: usize,
    },
}

/// Transmit side and bit clock of one lane.
#[derive(Debug, Clone)]
pub struct LaneDrive {
    /// Characters to send.
    pub transmitter: Transmitter,
    /// Bit clock offset from nominal.
    pub ppm: i32,
    /// Time of the first bit.
    pub phase_fs: u64,
}

impl LaneDrive {
    /// Nominal-rate drive.
    pub fn new(transmitter: Transmitter) -> Self { Self { transmitter, ppm: 0, phase_fs: 0 } }
}

/// Simulated link.
#[derive(Debug)]
pub struct Testbench {
    aligner: Aligner,
    transmitters: Vec<Transmitter>,
    scheduler: Scheduler,
}

impl Testbench {
    /// Creates a link whose consumer runs at `consumer_ppm` from the nominal symbol rate.
    pub fn new(
        config: &LinkConfig, drives: Vec<LaneDrive>, bit_period_fs: u64, consumer_ppm: i32,
    ) -> Result<Self, TestbenchError> {
        let aligner = Aligner::new(config)?;
        if drives.len() != config.lanes {
            return Err(TestbenchError::LaneCount { drives: drives.len(), lanes: config.lanes });
        }

        // Domains 0..lanes are bit clocks; the last one is the consumer clock.
        let mut domains = drives
            .iter()
            .map(|drive| ClockDomain::new(bit_period_fs, drive.ppm, drive.phase_fs))
            .collect::<Result<Vec<_>, _>>()?;
        domains.push(ClockDomain::new(bit_period_fs * u64::from(SYMBOL_BITS), consumer_ppm, 0)?);

        Ok(Self {
            aligner,
            transmitters: drives.into_iter().map(|drive| drive.transmitter).collect(),
            scheduler: Scheduler::new(domains)?,
        })
    }

    /// Alignment controller.
    pub fn aligner(&self) -> &Aligner { &self.aligner }

    /// Transmitter of lane `index`.
    pub fn transmitter_mut(&mut self, index: usize) -> Option<&mut Transmitter> { self.transmitters.get_mut(index) }

    /// Current virtual time.
    pub fn now_fs(&self) -> u64 { self.scheduler.now_fs() }

    /// Runs until the consumer clock has ticked `ticks` times and returns every release.
    pub fn run(&mut self, ticks: usize) -> Result<Vec<Release>, TestbenchError> {
        let consumer = self.transmitters.len();
        let mut releases = Vec::new();
        let mut ticked = 0;

        while ticked < ticks {
            let domain = self.scheduler.next_edge();
            if domain == consumer {
                let out = self.aligner.tick(());
                if let Some(release) = out.release {
                    trace!(now_fs = self.scheduler.now_fs(), ?release, "release");
                    releases.push(release);
                }
                ticked += 1;
                continue;
            }

            let tx = &mut self.transmitters[domain];
            if tx.pending() == 0 {
                tx.send(SKP)?;
            }
            let bit = tx.next_bit();
            self.aligner.lanes_mut()[domain].tick_producer(bit);
        }
        Ok(releases)
    }
}
