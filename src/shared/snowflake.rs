//! Snowflake ID Generator
//!
//! Twitter-style distributed unique ID generation. Message ids produced here
//! are strictly increasing within a process, which is what makes them usable
//! as stream cursors: resuming from the highest seen id can neither skip nor
//! replay a message.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default custom epoch (2020-01-01T00:00:00.000Z)
pub const DEFAULT_EPOCH: u64 = 1577836800000;

/// Snowflake ID generator
pub struct SnowflakeGenerator {
    machine_id: u64,
    epoch: u64,
    sequence: AtomicU64,
    last_timestamp: AtomicU64,
}

impl SnowflakeGenerator {
    /// Create a new snowflake generator.
    ///
    /// `machine_id` is masked to 10 bits; `epoch` is the custom epoch in
    /// milliseconds since the Unix epoch.
    pub fn new(machine_id: u64, epoch: u64) -> Self {
        Self {
            machine_id: machine_id & 0x3FF, // 10 bits
            epoch,
            sequence: AtomicU64::new(0),
            last_timestamp: AtomicU64::new(0),
        }
    }

    /// Generate a new snowflake ID
    pub fn generate(&self) -> i64 {
        let timestamp = self.current_timestamp();
        let last = self.last_timestamp.load(Ordering::SeqCst);

        let sequence = if timestamp == last {
            (self.sequence.fetch_add(1, Ordering::SeqCst) + 1) & 0xFFF
        } else {
            self.last_timestamp.store(timestamp, Ordering::SeqCst);
            self.sequence.store(0, Ordering::SeqCst);
            0
        };

        let id = ((timestamp - self.epoch) << 22)
            | (self.machine_id << 12)
            | sequence;

        id as i64
    }

    /// Get current timestamp in milliseconds
    fn current_timestamp(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis() as u64
    }
}

/// Extract the creation timestamp (ms since Unix epoch) from a snowflake ID
pub fn extract_timestamp(snowflake: i64, epoch: u64) -> u64 {
    ((snowflake as u64) >> 22) + epoch
}
