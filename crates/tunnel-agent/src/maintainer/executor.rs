//! Effect executor. The only place the maintainer touches I/O.
//!
//! - ResolveRelay -> directory lookup of the relay record
//! - ProbeRelay -> host connection table
//! - DialRelay -> host.connect()
//! - PublishSelf -> circuit record written to the directory
//! - Sleep -> clock

use crate::config::AgentConfig;
use crate::directory::PeerDirectory;
use crate::host::Host;
use crate::{connector, prober, publisher, resolver};

use super::clock::Clock;
use super::effect::{MaintainerEffect, Outcome};

/// Perform one effect and report what came of it.
pub(super) async fn execute<H, D, C>(
    effect: MaintainerEffect,
    host: &H,
    directory: &D,
    clock: &C,
    config: &AgentConfig,
) -> Outcome
where
    H: Host + ?Sized,
    D: PeerDirectory + ?Sized,
    C: Clock,
{
    match effect {
        MaintainerEffect::ResolveRelay => {
            Outcome::Resolved(resolver::resolve_relay(directory, &config.relay_name).await)
        }
        MaintainerEffect::ProbeRelay(relay) => Outcome::Probed {
            connected: prober::has_connection(host, &relay).await,
        },
        MaintainerEffect::DialRelay(relay) => Outcome::Dialed(connector::dial(host, &relay).await),
        MaintainerEffect::PublishSelf(relay) => Outcome::Published(
            publisher::publish_self(host, directory, &config.node_name, &relay).await,
        ),
        MaintainerEffect::Sleep(duration) => {
            clock.sleep(duration).await;
            Outcome::Slept
        }
    }
}
