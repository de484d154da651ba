//! Relay connectivity state machine.
//!
//! Pure: no I/O, no clock. `effect()` names what must happen next,
//! `apply()` consumes the result and moves to the next phase.
//!
//! Resolving ─ok─▶ Probing ─connected─▶ Sleeping ─▶ Resolving …
//!     │ err          │ not connected
//!     ▼              ▼
//! ResolveBackoff   Dialing ─ok─▶ Publishing (server-client) ─ok─▶ Sleeping
//!                    │ err           │ err
//!                    ▼               ▼
//!                  RetryBackoff ─budget left─▶ Dialing
//!                    └─exhausted─▶ Sleeping
use tunnel_transport::PeerAddrInfo;

use crate::config::AgentConfig;
use crate::connector::RetryBudget;
use crate::types::AgentMode;

use super::effect::{MaintainerEffect, MaintainerEvent, Outcome};

/// Where the maintenance cycle currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Resolving,
    ResolveBackoff,
    Probing {
        relay: PeerAddrInfo,
    },
    Dialing {
        relay: PeerAddrInfo,
        budget: RetryBudget,
    },
    Publishing {
        relay: PeerAddrInfo,
        budget: RetryBudget,
    },
    RetryBackoff {
        relay: PeerAddrInfo,
        budget: RetryBudget,
    },
    Sleeping,
}

pub struct MaintainerState {
    phase: Phase,
    mode: AgentMode,
    config: AgentConfig,
}

impl MaintainerState {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            phase: Phase::Resolving,
            mode: config.mode,
            config: config.clone(),
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The effect the current phase needs performed.
    pub fn effect(&self) -> MaintainerEffect {
        match &self.phase {
            Phase::Resolving => MaintainerEffect::ResolveRelay,
            Phase::ResolveBackoff => MaintainerEffect::Sleep(self.config.resolve_backoff),
            Phase::Probing { relay } => MaintainerEffect::ProbeRelay(relay.id),
            Phase::Dialing { relay, .. } => MaintainerEffect::DialRelay(relay.clone()),
            Phase::Publishing { relay, .. } => MaintainerEffect::PublishSelf(relay.clone()),
            Phase::RetryBackoff { .. } => MaintainerEffect::Sleep(self.config.retry_connect_duration),
            Phase::Sleeping => MaintainerEffect::Sleep(self.config.heartbeat_duration),
        }
    }

    /// Feed back the outcome of `effect()` and transition.
    pub fn apply(&mut self, outcome: Outcome) -> Vec<MaintainerEvent> {
        let mut events = vec![];
        let phase = std::mem::replace(&mut self.phase, Phase::Resolving);

        self.phase = match (phase, outcome) {
            (Phase::Resolving, Outcome::Resolved(Ok(relay))) => {
                events.push(MaintainerEvent::RelayResolved {
                    relay: relay.id,
                    addrs: relay.addrs.len(),
                });
                Phase::Probing { relay }
            }
            (Phase::Resolving, Outcome::Resolved(Err(e))) => {
                events.push(MaintainerEvent::ResolveFailed {
                    description: e.to_string(),
                });
                Phase::ResolveBackoff
            }
            (Phase::ResolveBackoff, Outcome::Slept) => Phase::Resolving,

            (Phase::Probing { relay }, Outcome::Probed { connected: true }) => {
                events.push(MaintainerEvent::AlreadyConnected { relay: relay.id });
                Phase::Sleeping
            }
            (Phase::Probing { relay }, Outcome::Probed { connected: false }) => {
                events.push(MaintainerEvent::NotConnected {
                    relay: relay.id,
                    addrs: relay.addrs.clone(),
                });
                let budget = RetryBudget::new(self.config.retry_connect_time);
                if budget.exhausted() {
                    events.push(MaintainerEvent::RetriesExhausted {
                        relay: relay.id,
                        attempts: 0,
                    });
                    Phase::Sleeping
                } else {
                    Phase::Dialing { relay, budget }
                }
            }

            (Phase::Dialing { relay, budget }, Outcome::Dialed(Ok(()))) => {
                events.push(MaintainerEvent::Connected {
                    relay: relay.id,
                    attempt: budget.used() + 1,
                });
                if self.mode.publishes_self() {
                    Phase::Publishing { relay, budget }
                } else {
                    Phase::Sleeping
                }
            }
            (Phase::Dialing { relay, mut budget }, Outcome::Dialed(Err(e))) => {
                budget.record_failure();
                events.push(MaintainerEvent::DialFailed {
                    relay: relay.id,
                    attempt: budget.used(),
                    description: e.to_string(),
                });
                Phase::RetryBackoff { relay, budget }
            }

            (Phase::Publishing { .. }, Outcome::Published(Ok(record))) => {
                events.push(MaintainerEvent::Published { record });
                Phase::Sleeping
            }
            (Phase::Publishing { relay, mut budget }, Outcome::Published(Err(e))) => {
                budget.record_failure();
                events.push(MaintainerEvent::PublishFailed {
                    attempt: budget.used(),
                    description: e.to_string(),
                });
                Phase::RetryBackoff { relay, budget }
            }

            (Phase::RetryBackoff { relay, budget }, Outcome::Slept) => {
                if budget.exhausted() {
                    events.push(MaintainerEvent::RetriesExhausted {
                        relay: relay.id,
                        attempts: budget.used(),
                    });
                    Phase::Sleeping
                } else {
                    Phase::Dialing { relay, budget }
                }
            }

            (Phase::Sleeping, Outcome::Slept) => {
                events.push(MaintainerEvent::CycleCompleted);
                Phase::Resolving
            }

            (phase, outcome) => {
                tracing::warn!(?phase, ?outcome, "outcome does not match phase, ignored");
                phase
            }
        };

        events
    }
}
