//! Bounded-attempt relay connection.

use tunnel_transport::PeerAddrInfo;

use crate::error::TunnelError;
use crate::host::Host;

/// Per-cycle attempt counter. Reset every cycle, never persisted.
///
/// Dial failures and publish failures draw from the same budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    used: u32,
    max: u32,
}

impl RetryBudget {
    pub fn new(max: u32) -> Self {
        Self { used: 0, max }
    }

    /// Count one failed attempt.
    pub fn record_failure(&mut self) {
        self.used = self.used.saturating_add(1);
    }

    /// Failed attempts so far.
    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// No attempts left this cycle.
    pub fn exhausted(&self) -> bool {
        self.used >= self.max
    }
}

/// One full dial of the relay's address set.
pub async fn dial<H: Host + ?Sized>(host: &H, relay: &PeerAddrInfo) -> Result<(), TunnelError> {
    host.connect(relay)
        .await
        .map_err(|source| TunnelError::Dial {
            peer: relay.id,
            source,
        })
}
