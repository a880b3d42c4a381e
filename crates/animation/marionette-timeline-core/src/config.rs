//! Core configuration for marionette-timeline-core.

use serde::{Deserialize, Serialize};

/// Engine sizing and backpressure policy. Kept small; extend without
/// breaking the serde shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Initial capacity hint for the evaluator arena (slots are reused
    /// across clip lifetimes via a free list).
    pub evaluator_capacity: usize,
    /// Maximum events buffered per tick; overflow is dropped and counted.
    pub max_events_per_tick: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            evaluator_capacity: 64,
            max_events_per_tick: 256,
        }
    }
}
