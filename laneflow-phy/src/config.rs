//! Link configuration.

use thiserror::Error;

use crate::constants::*;

/// Configuration error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Lane count out of range.
    #[error("lane count {0} is outside 1..={max}", max = MAX_LANES)]
    LaneCount(usize),
    /// Compensation buffer capacity is not a power of two, or too small.
    #[error("compensation buffer capacity {0} must be a power of two no smaller than {min}", min = MIN_ELASTIC_CAPACITY)]
    ElasticCapacity(usize),
    /// Deskew queue capacity is not a power of two.
    #[error("deskew queue capacity {0} must be a power of two")]
    DeskewCapacity(usize),
    /// Skew window bound leaves no open window.
    #[error("skew window bound must be at least 2, got {0}")]
    SkewBound(u8),
}

/// Link configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Number of lanes.
    pub lanes: usize,
    /// Compensation buffer capacity (entries).
    pub elastic_capacity: usize,
    /// Deskew queue capacity (entries).
    pub deskew_capacity: usize,
    /// Skew window bound (consumer ticks, counted from 1).
    pub skew_bound: u8,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            lanes: 1,
            elastic_capacity: DEFAULT_ELASTIC_CAPACITY,
            deskew_capacity: DEFAULT_DESKEW_CAPACITY,
            skew_bound: DEFAULT_SKEW_BOUND,
        }
    }
}

impl LinkConfig {
    /// Starts a builder from the defaults.
    pub fn builder() -> LinkConfigBuilder { LinkConfigBuilder::default() }

    /// Checks every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lanes == 0 || self.lanes > MAX_LANES {
            return Err(ConfigError::LaneCount(self.lanes));
        }
        validate_elastic_capacity(self.elastic_capacity)?;
        validate_deskew_capacity(self.deskew_capacity)?;
        if self.skew_bound < 2 {
            return Err(ConfigError::SkewBound(self.skew_bound));
        }
        Ok(())
    }
}

pub(crate) fn validate_elastic_capacity(capacity: usize) -> Result<(), ConfigError> {
    if !capacity.is_power_of_two() || capacity < MIN_ELASTIC_CAPACITY {
        return Err(ConfigError::ElasticCapacity(capacity));
    }
    Ok(())
}

pub(crate) fn validate_deskew_capacity(capacity: usize) -> Result<(), ConfigError> {
    if !capacity.is_power_of_two() {
        return Err(ConfigError::DeskewCapacity(capacity));
    }
    Ok(())
}

/// Builder for [`LinkConfig`].
#[derive(Debug, Clone, Default)]
pub struct LinkConfigBuilder {
    config: LinkConfig,
}

impl LinkConfigBuilder {
    /// Sets the lane count.
    pub fn lanes(mut self, lanes: usize) -> Self {
        self.config.lanes = lanes;
        self
    }

    /// Sets the compensation buffer capacity.
    pub fn elastic_capacity(mut self, capacity: usize) -> Self {
        self.config.elastic_capacity = capacity;
        self
    }

    /// Sets the deskew queue capacity.
    pub fn deskew_capacity(mut self, capacity: usize) -> Self {
        self.config.deskew_capacity = capacity;
        self
    }

    /// Sets the skew window bound.
    pub fn skew_bound(mut self, bound: u8) -> Self {
        self.config.skew_bound = bound;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<LinkConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
