//! Sizing and resize policy for `Table`.

use crate::error::{Result, TableError};

/// Resize policy. The defaults match a 101-slot table that doubles past
/// 70% load and halves below 10% occupancy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    /// Slots allocated at creation. Shrinking never goes below this.
    pub initial_capacity: usize,

    /// Grow before inserting a new key once `(count + tombstones) / capacity`
    /// exceeds this.
    pub grow_threshold: f64,

    /// Shrink after a removal once `count / capacity` drops below this.
    pub shrink_threshold: f64,

    /// Multiplier on grow, divisor on shrink.
    pub growth_factor: usize,
}

pub const DEFAULT_INITIAL_CAPACITY: usize = 101; // prime
pub const DEFAULT_GROW_THRESHOLD: f64 = 0.7;
pub const DEFAULT_SHRINK_THRESHOLD: f64 = 0.1;
pub const DEFAULT_GROWTH_FACTOR: usize = 2;

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            grow_threshold: DEFAULT_GROW_THRESHOLD,
            shrink_threshold: DEFAULT_SHRINK_THRESHOLD,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}

impl TableConfig {
    pub fn builder() -> TableConfigBuilder {
        TableConfigBuilder::default()
    }

    /// Reject configurations that would let the table fill up or thrash
    /// between grow and shrink.
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(TableError::InvalidConfig(
                "initial_capacity must be at least 1".into(),
            ));
        }
        if !(self.grow_threshold > 0.0 && self.grow_threshold < 1.0) {
            return Err(TableError::InvalidConfig(format!(
                "grow_threshold {} must be in (0, 1)",
                self.grow_threshold
            )));
        }
        if !(self.shrink_threshold >= 0.0 && self.shrink_threshold < self.grow_threshold) {
            return Err(TableError::InvalidConfig(format!(
                "shrink_threshold {} must be in [0, grow_threshold)",
                self.shrink_threshold
            )));
        }
        if self.growth_factor < 2 {
            return Err(TableError::InvalidConfig(format!(
                "growth_factor {} must be at least 2",
                self.growth_factor
            )));
        }
        // After a shrink the occupancy is multiplied by growth_factor; it
        // must land below grow_threshold.
        if self.shrink_threshold * self.growth_factor as f64 >= self.grow_threshold {
            return Err(TableError::InvalidConfig(format!(
                "shrink_threshold {} * growth_factor {} must stay below grow_threshold {}",
                self.shrink_threshold, self.growth_factor, self.grow_threshold
            )));
        }
        Ok(())
    }
}

/// Builder for `TableConfig`.
#[derive(Default)]
pub struct TableConfigBuilder {
    config: TableConfig,
}

impl TableConfigBuilder {
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    pub fn grow_threshold(mut self, threshold: f64) -> Self {
        self.config.grow_threshold = threshold;
        self
    }

    pub fn shrink_threshold(mut self, threshold: f64) -> Self {
        self.config.shrink_threshold = threshold;
        self
    }

    pub fn growth_factor(mut self, factor: usize) -> Self {
        self.config.growth_factor = factor;
        self
    }

    pub fn build(self) -> TableConfig {
        self.config
    }
}
