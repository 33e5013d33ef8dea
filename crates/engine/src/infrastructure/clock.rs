//! Clocks used for unlock timestamps and request deadlines.

use chrono::{DateTime, Utc};

use crate::infrastructure::ports::ClockPort;

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Moves forward by `step` every time it is read, so a deadline can expire
/// between two stages of one operation.
#[cfg(test)]
pub struct SteppingClock {
    start: DateTime<Utc>,
    step: chrono::Duration,
    reads: std::sync::atomic::AtomicI32,
}

#[cfg(test)]
impl SteppingClock {
    pub fn new(start: DateTime<Utc>, step: chrono::Duration) -> Self {
        Self {
            start,
            step,
            reads: std::sync::atomic::AtomicI32::new(0),
        }
    }
}

#[cfg(test)]
impl ClockPort for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let reads = self
            .reads
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.start + self.step * reads
    }
}
