//! Core pipeline configuration.
//!
//! Sizing of the bounded bus that carries polled records to the processor.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Core system configuration parameters.
#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone)]
pub struct CoreConfig {
    /// Record bus between the poller and the processor.
    #[validate(nested)]
    #[serde(default)]
    pub bus: BusConfig,
}

/// Bounded FIFO between poller and processor.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct BusConfig {
    /// Records buffered before the poller blocks.
    #[serde(default = "default_capacity")]
    #[validate(range(min = 1, max = 1_048_576))]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    1024
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}
