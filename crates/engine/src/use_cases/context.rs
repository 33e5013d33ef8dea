//! Request Context
//!
//! Per-call information supplied by the host runtime: a correlation id for
//! logging, an optional deadline and a cancellation token.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::infrastructure::correlation::CorrelationId;
use crate::infrastructure::ports::ClockPort;

/// Why a request stopped before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("request cancelled")]
    Cancelled,
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

/// Context for a single engine call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: CorrelationId,
    deadline: Option<DateTime<Utc>>,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// A context with a fresh correlation id, no deadline and a live token.
    pub fn new() -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            deadline: None,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` after the clock's current time.
    pub fn with_timeout(self, clock: &dyn ClockPort, timeout: Duration) -> Self {
        match chrono::Duration::from_std(timeout) {
            Ok(timeout) => self.with_deadline(clock.now() + timeout),
            Err(_) => self,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Fail if the caller gave up or the deadline has passed.
    pub fn ensure_active(&self, clock: &dyn ClockPort) -> Result<(), ContextError> {
        if self.cancellation.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if clock.now() >= deadline => Err(ContextError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
