//! Connectivity maintainer. Keeps the agent attached to its relay.
//!
//! The maintainer owns the injected host and directory, a clock, the pure
//! `MaintainerState`, and the live metrics. Each `step()` asks the state
//! for its next effect, hands it to the executor, and feeds the outcome
//! back. Nothing here ever fails: every error degrades to a retry.
pub mod clock;
mod effect;
mod executor;
mod state;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::AgentConfig;
use crate::directory::PeerDirectory;
use crate::host::Host;
use crate::metrics::{MaintainerMetrics, MetricsSnapshot};

pub use clock::{Clock, TokioClock};
pub use effect::{MaintainerEffect, MaintainerEvent, Outcome};
pub use state::{MaintainerState, Phase};

pub struct Maintainer<H: ?Sized, D: ?Sized, C = TokioClock> {
    host: Arc<H>,
    directory: Arc<D>,
    clock: C,
    config: AgentConfig,
    state: MaintainerState,
    metrics: Arc<MaintainerMetrics>,
}

impl<H, D> Maintainer<H, D, TokioClock>
where
    H: Host + ?Sized,
    D: PeerDirectory + ?Sized,
{
    pub fn new(host: Arc<H>, directory: Arc<D>, config: AgentConfig) -> Self {
        Self::with_clock(host, directory, TokioClock, config)
    }
}

impl<H, D, C> Maintainer<H, D, C>
where
    H: Host + ?Sized,
    D: PeerDirectory + ?Sized,
    C: Clock,
{
    /// Build a maintainer that sleeps through `clock`.
    pub fn with_clock(host: Arc<H>, directory: Arc<D>, clock: C, config: AgentConfig) -> Self {
        Self {
            state: MaintainerState::new(&config),
            host,
            directory,
            clock,
            config,
            metrics: Arc::new(MaintainerMetrics::default()),
        }
    }

    pub fn phase(&self) -> &Phase {
        self.state.phase()
    }

    /// Shared handle to the live counters.
    pub fn metrics(&self) -> Arc<MaintainerMetrics> {
        self.metrics.clone()
    }

    /// Perform the next effect and apply its outcome.
    pub async fn step(&mut self) -> Vec<MaintainerEvent> {
        let effect = self.state.effect();
        match &effect {
            MaintainerEffect::ResolveRelay => {
                tracing::debug!(name = %self.config.relay_name, "resolving relay");
            }
            MaintainerEffect::ProbeRelay(relay) => {
                tracing::debug!(%relay, "probing relay connection");
            }
            MaintainerEffect::DialRelay(relay) => {
                self.metrics.dial_attempts.inc();
                tracing::info!(relay = %relay.id, addrs = ?relay.addrs, "connecting to relay");
            }
            MaintainerEffect::PublishSelf(_) => {}
            MaintainerEffect::Sleep(duration) => {
                tracing::debug!(?duration, "sleeping");
            }
        }

        let outcome = executor::execute(
            effect,
            &*self.host,
            &*self.directory,
            &self.clock,
            &self.config,
        )
        .await;

        let events = self.state.apply(outcome);
        for event in &events {
            self.observe(event);
        }
        events
    }

    /// Step until the heartbeat sleep that ends the current cycle is done.
    ///
    /// Returns every event the cycle produced. Does not return while the
    /// relay cannot be resolved.
    pub async fn run_cycle(&mut self) -> Vec<MaintainerEvent> {
        let mut events = vec![];
        loop {
            let batch = self.step().await;
            let done = batch
                .iter()
                .any(|e| matches!(e, MaintainerEvent::CycleCompleted));
            events.extend(batch);
            if done {
                return events;
            }
        }
    }

    /// Run forever.
    pub async fn run(mut self) {
        tracing::info!(
            node = %self.config.node_name,
            mode = %self.config.mode,
            relay = %self.config.relay_name,
            "maintainer started"
        );
        loop {
            self.step().await;
        }
    }

    /// Run on a background task.
    pub fn spawn(self) -> MaintainerHandle
    where
        H: 'static,
        D: 'static,
        C: 'static,
    {
        let metrics = self.metrics.clone();
        let task = tokio::spawn(self.run());
        MaintainerHandle { metrics, task }
    }

    fn observe(&self, event: &MaintainerEvent) {
        let m = &self.metrics;
        match event {
            MaintainerEvent::RelayResolved { relay, addrs } => {
                tracing::debug!(%relay, addrs, "relay resolved");
            }
            MaintainerEvent::ResolveFailed { description } => {
                m.resolve_failures.inc();
                tracing::error!(
                    name = %self.config.relay_name,
                    backoff = ?self.config.resolve_backoff,
                    "relay lookup failed: {description}"
                );
            }
            MaintainerEvent::AlreadyConnected { relay } => {
                m.already_connected.inc();
                tracing::debug!(%relay, "relay connection healthy");
            }
            MaintainerEvent::NotConnected { relay, addrs } => {
                tracing::warn!(%relay, ?addrs, "connection to relay not established");
            }
            MaintainerEvent::DialFailed {
                relay,
                attempt,
                description,
            } => {
                m.dial_failures.inc();
                tracing::warn!(
                    %relay,
                    attempt,
                    max = self.config.retry_connect_time,
                    "connect to relay failed: {description}"
                );
            }
            MaintainerEvent::Connected { relay, attempt } => {
                m.connects.inc();
                tracing::info!(%relay, attempt, "connected to relay");
            }
            MaintainerEvent::Published { record } => {
                m.publishes.inc();
                tracing::info!(
                    node = %self.config.node_name,
                    addrs = record.addrs.len(),
                    "published relay-circuit record"
                );
            }
            MaintainerEvent::PublishFailed {
                attempt,
                description,
            } => {
                m.publish_failures.inc();
                tracing::warn!(
                    node = %self.config.node_name,
                    attempt,
                    "publish failed: {description}"
                );
            }
            MaintainerEvent::RetriesExhausted { relay, attempts } => {
                m.retries_exhausted.inc();
                tracing::warn!(
                    %relay,
                    attempts,
                    "giving up on relay until next heartbeat"
                );
            }
            MaintainerEvent::CycleCompleted => {
                m.cycles.inc();
            }
        }
    }
}

/// Handle to a spawned maintainer.
pub struct MaintainerHandle {
    metrics: Arc<MaintainerMetrics>,
    task: JoinHandle<()>,
}

impl MaintainerHandle {
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Stop the loop. Only meant for process shutdown.
    pub fn abort(&self) {
        self.task.abort();
    }
}
