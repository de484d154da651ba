use std::time::Duration;

use tunnel_transport::{Multiaddr, PeerAddrInfo, PeerId};

use crate::error::TunnelError;

/// Intention produced by the pure logic of `MaintainerState`.
///
/// `MaintainerState::effect()` names the next one; the executor performs
/// it against the injected collaborators and hands back an [`Outcome`].
#[derive(Debug, Clone, PartialEq)]
pub enum MaintainerEffect {
    /// Look up the relay's record in the directory.
    ResolveRelay,
    /// Check for an established connection to the relay.
    ProbeRelay(PeerId),
    /// One full dial of the relay's address set.
    DialRelay(PeerAddrInfo),
    /// Derive the agent's circuit record and write it to the directory.
    PublishSelf(PeerAddrInfo),
    /// Suspend the loop.
    Sleep(Duration),
}

/// Result of executing a [`MaintainerEffect`], fed back into the state.
#[derive(Debug)]
pub enum Outcome {
    Resolved(Result<PeerAddrInfo, TunnelError>),
    Probed { connected: bool },
    Dialed(Result<(), TunnelError>),
    Published(Result<PeerAddrInfo, TunnelError>),
    Slept,
}

/// What happened during a transition. Drives logging and metrics.
#[derive(Debug, Clone)]
pub enum MaintainerEvent {
    RelayResolved { relay: PeerId, addrs: usize },
    ResolveFailed { description: String },
    AlreadyConnected { relay: PeerId },
    NotConnected { relay: PeerId, addrs: Vec<Multiaddr> },
    DialFailed { relay: PeerId, attempt: u32, description: String },
    Connected { relay: PeerId, attempt: u32 },
    Published { record: PeerAddrInfo },
    PublishFailed { attempt: u32, description: String },
    /// The cycle's retry budget ran out; the next cycle starts over.
    RetriesExhausted { relay: PeerId, attempts: u32 },
    /// The heartbeat sleep finished.
    CycleCompleted,
}
