//! Table configuration shared by both containers.

use thiserror::Error;

/// Load factor used when none is given.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("load factor must lie strictly between 0 and 1, got {0}")]
    LoadFactorOutOfRange(f64),
}

/// Initial slot count and maximum tolerated load factor.
///
/// `initial_capacity` is the exact number of slots allocated up front; zero
/// defers allocation to the first insertion.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TableConfig {
    initial_capacity: usize,
    load_factor: f64,
}

impl TableConfig {
    /// Checked constructor; rejects load factors outside `(0, 1)` (and NaN).
    pub fn new(initial_capacity: usize, load_factor: f64) -> Result<Self, ConfigError> {
        if !valid_load_factor(load_factor) {
            return Err(ConfigError::LoadFactorOutOfRange(load_factor));
        }
        Ok(Self {
            initial_capacity,
            load_factor,
        })
    }

    pub const fn with_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Unchecked setter. The range is only asserted in debug builds.
    pub fn with_load_factor(mut self, load_factor: f64) -> Self {
        debug_assert!(
            valid_load_factor(load_factor),
            "load factor must lie strictly between 0 and 1"
        );
        self.load_factor = load_factor;
        self
    }

    pub const fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    pub const fn load_factor(&self) -> f64 {
        self.load_factor
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

#[inline]
pub(crate) fn valid_load_factor(load_factor: f64) -> bool {
    load_factor > 0.0 && load_factor < 1.0
}
