//! Independent clock domains and a deterministic scheduler that interleaves their ticks.
//!
//! Time is virtual and measured in femtoseconds, which keeps ppm-scale period offsets integral.

use thiserror::Error;

/// Femtoseconds per picosecond.
pub const FS_PER_PS: u64 = 1_000;

/// Clock configuration error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    /// Period is zero, or the ppm offset drives it to zero or below.
    #[error("clock period must be positive (nominal {period_fs} fs, {ppm} ppm)")]
    NonPositivePeriod {
        /// Nominal period.
        period_fs: u64,
        /// Requested offset.
        ppm: i32,
    },
    /// Scheduler has no domains to step.
    #[error("scheduler has no clock domains")]
    Empty,
}

/// A free-running clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockDomain {
    period_fs: u64,
    next_edge_fs: u64,
}

impl ClockDomain {
    /// Creates a clock with the given nominal period, offset by `ppm` parts per million.
    ///
    /// A positive offset makes the clock slower. The first edge is at `phase_fs`.
    pub fn new(period_fs: u64, ppm: i32, phase_fs: u64) -> Result<Self, ClockError> {
        let delta = i128::from(period_fs) * i128::from(ppm) / 1_000_000;
        let period = i128::from(period_fs) + delta;
        if period <= 0 {
            return Err(ClockError::NonPositivePeriod { period_fs, ppm });
        }
        let period_fs = u64::try_from(period).map_err(|_| ClockError::NonPositivePeriod { period_fs, ppm })?;
        Ok(Self { period_fs, next_edge_fs: phase_fs })
    }

    /// Effective period.
    pub fn period_fs(&self) -> u64 { self.period_fs }

    /// Time of the next edge.
    pub fn next_edge_fs(&self) -> u64 { self.next_edge_fs }

    fn advance(&mut self) { self.next_edge_fs += self.period_fs; }
}

/// Steps a set of clock domains in time order.
///
/// Edges falling at the same instant are delivered in domain index order, so a run is fully
/// reproducible.
#[derive(Debug, Clone)]
pub struct Scheduler {
    domains: Vec<ClockDomain>,
    now_fs: u64,
}

impl Scheduler {
    /// Creates a scheduler over `domains`.
    pub fn new(domains: Vec<ClockDomain>) -> Result<Self, ClockError> {
        if domains.is_empty() {
            return Err(ClockError::Empty);
        }
        Ok(Self { domains, now_fs: 0 })
    }

    /// Current virtual time: the time of the most recently delivered edge.
    pub fn now_fs(&self) -> u64 { self.now_fs }

    /// Returns the domain index of the next edge and advances past it.
    pub fn next_edge(&mut self) -> usize {
        let (index, domain) = self
            .domains
            .iter_mut()
            .enumerate()
            .min_by_key(|(index, domain)| (domain.next_edge_fs, *index))
            .expect("scheduler is never empty");
        self.now_fs = domain.next_edge_fs;
        domain.advance();
        index
    }
}

impl Iterator for Scheduler {
    type Item = usize;

    fn next(&mut self) -> Option<usize> { Some(self.next_edge()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ppm_offset_stretches_period() {
        let clock = ClockDomain::new(400 * FS_PER_PS, 300, 0).unwrap();
        assert_eq!(clock.period_fs(), 400_120);
        let clock = ClockDomain::new(400 * FS_PER_PS, -300, 0).unwrap();
        assert_eq!(clock.period_fs(), 399_880);
    }

    #[test]
    fn zero_period_is_rejected() {
        assert_eq!(ClockDomain::new(0, 0, 0), Err(ClockError::NonPositivePeriod { period_fs: 0, ppm: 0 }));
        assert_eq!(Scheduler::new(Vec::new()).unwrap_err(), ClockError::Empty);
    }

    #[test]
    fn edges_interleave_by_time() {
        let fast = ClockDomain::new(10, 0, 0).unwrap();
        let slow = ClockDomain::new(25, 0, 0).unwrap();
        let scheduler = Scheduler::new(vec![fast, slow]).unwrap();
        let order = scheduler.take(7).collect::<Vec<_>>();
        // t=0: fast, slow; t=10: fast; t=20: fast; t=25: slow; t=30: fast; t=40: fast
        assert_eq!(order, vec![0, 1, 0, 0, 1, 0, 0]);
    }

    #[test]
    fn rates_follow_periods() {
        let a = ClockDomain::new(1_000, 1_000, 0).unwrap();
        let b = ClockDomain::new(1_000, 0, 0).unwrap();
        let counts = Scheduler::new(vec![a, b]).unwrap().take(200_000).fold([0u32; 2], |mut acc, i| {
            acc[i] += 1;
            acc
        });
        // 0.1% slower domain ticks about 0.1% less often.
        assert!(counts[1] > counts[0]);
        assert!(counts[1] - counts[0] < 200);
    }
}
