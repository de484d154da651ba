//! Relay-circuit address derivation.
//!
//! Produces the agent's own reachable record: its direct addresses plus one
//! `<relay addr>/p2p/<relay id>/p2p-circuit` address per relay address, so
//! peers that cannot dial the agent directly can reach it through the relay.
use tunnel_transport::{relay_circuit, Multiaddr, PeerAddrInfo, PeerId};

/// Build the agent's record from its identity, direct addresses and the relay.
///
/// Relay addresses already pinned to the relay keep their `/p2p` component
/// and only gain `/p2p-circuit`. Circuits and addresses pinned to another
/// peer are skipped with a warning. The result always contains the direct
/// addresses, in order, followed by the derived circuit addresses in relay
/// order.
pub fn info_from_host_and_relay(
    local_id: PeerId,
    local_addrs: Vec<Multiaddr>,
    relay: &PeerAddrInfo,
) -> PeerAddrInfo {
    let mut info = PeerAddrInfo::new(local_id, local_addrs);
    for addr in &relay.addrs {
        match relay_circuit(addr, relay.id) {
            Ok(circuit) => info.addrs.push(circuit),
            Err(e) => {
                tracing::warn!(relay = %relay.id, %addr, "skipping relay address: {e}");
            }
        }
    }
    info
}
