//! Port traits for infrastructure boundaries.
//!
//! The host runtime supplies per-user storage and the economy; the engine
//! supplies everything else. Ports:
//! - `ProgressionStateRepo` / `TutorialStateRepo` - versioned snapshots
//! - `WalletPort` - charges and refunds for purchases
//! - `ClockPort` - timestamps and deadlines

mod error;
mod external;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{ProgressionStateRepo, TutorialStateRepo, Versioned};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::WalletPort;

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::{MockProgressionStateRepo, MockTutorialStateRepo};

#[cfg(test)]
pub use external::MockWalletPort;

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::{RepoError, WalletError};
