//! Replay protection based on the signed delivery timestamp.

use super::RejectionReason;
use crate::Timestamp;
use std::time::Duration;
use tracing::debug;

/// Default symmetric tolerance window: five minutes
pub const DEFAULT_TOLERANCE_SECONDS: u64 = 300;

/// Rejects timestamps outside a symmetric window around the current time
///
/// A timestamp exactly `tolerance` away from now is still accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayGuard {
    tolerance: Duration,
}

impl ReplayGuard {
    pub fn new(tolerance: Duration) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Check a timestamp header against the current time
    ///
    /// Returns `Ok(None)` when no header was sent; whether that is acceptable
    /// is the caller's policy decision.
    pub fn check(&self, timestamp_header: Option<&str>) -> Result<Option<Timestamp>, RejectionReason> {
        self.check_at(timestamp_header, Timestamp::now())
    }

    /// Check a timestamp header against an explicit `now`
    pub fn check_at(
        &self,
        timestamp_header: Option<&str>,
        now: Timestamp,
    ) -> Result<Option<Timestamp>, RejectionReason> {
        let Some(header) = timestamp_header else {
            return Ok(None);
        };

        let signed_at =
            Timestamp::from_iso8601(header).map_err(|_| RejectionReason::InvalidTimestamp)?;

        let skew = now.signed_duration_since(signed_at).abs();
        let within_window = skew
            .to_std()
            .map(|skew| skew <= self.tolerance)
            .unwrap_or(false);

        if !within_window {
            debug!(
                signed_at = %signed_at,
                skew_seconds = skew.num_seconds(),
                tolerance_seconds = self.tolerance.as_secs(),
                "Webhook timestamp outside tolerance window"
            );
            return Err(RejectionReason::StaleOrFutureTimestamp);
        }

        Ok(Some(signed_at))
    }
}

impl Default for ReplayGuard {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TOLERANCE_SECONDS))
    }
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
