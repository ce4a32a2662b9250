use std::time::Duration;

use crate::error::{GridError, Result};

pub const ROWS: usize = 30;
pub const COLUMNS: usize = 30;
pub const GENERATION_INTERVAL_MS: u64 = 1000;
pub const ALIVE_PROBABILITY: f64 = 0.5;

/// Chance that a freshly randomized cell starts alive. Always within `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AliveProbability(f64);

impl AliveProbability {
    pub fn new(probability: f64) -> Result<Self> {
        if (0.0..=1.0).contains(&probability) {
            Ok(Self(probability))
        } else {
            Err(GridError::InvalidProbability(probability))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for AliveProbability {
    fn default() -> Self {
        Self(ALIVE_PROBABILITY)
    }
}

/// Fixed for the lifetime of a [`Simulation`](crate::Simulation).
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub rows: usize,
    pub columns: usize,
    pub generation_interval: Duration,
    pub alive_probability: AliveProbability,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rows: ROWS,
            columns: COLUMNS,
            generation_interval: Duration::from_millis(GENERATION_INTERVAL_MS),
            alive_probability: AliveProbability::default(),
        }
    }
}

impl SimulationConfig {
    pub fn with_size(mut self, rows: usize, columns: usize) -> Self {
        self.rows = rows;
        self.columns = columns;
        self
    }

    pub fn with_generation_interval(mut self, interval: Duration) -> Self {
        self.generation_interval = interval;
        self
    }

    pub fn with_alive_probability(mut self, probability: AliveProbability) -> Self {
        self.alive_probability = probability;
        self
    }

    /// A simulated board needs at least one row and one column.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.columns == 0 {
            return Err(GridError::InvalidDimensions(format!(
                "simulation needs a non-empty board, got {}x{}",
                self.rows, self.columns
            )));
        }
        Ok(())
    }
}
