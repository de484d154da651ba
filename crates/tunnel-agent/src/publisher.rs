//! Publication of the agent's own reachable record.

use tunnel_transport::PeerAddrInfo;

use crate::circuit::info_from_host_and_relay;
use crate::directory::PeerDirectory;
use crate::error::TunnelError;
use crate::host::Host;

/// Derive the agent's record from `host` and `relay` and store it under
/// `node_name`. Returns the record that was written.
pub async fn publish_self<H, D>(
    host: &H,
    directory: &D,
    node_name: &str,
    relay: &PeerAddrInfo,
) -> Result<PeerAddrInfo, TunnelError>
where
    H: Host + ?Sized,
    D: PeerDirectory + ?Sized,
{
    let info = info_from_host_and_relay(host.id(), host.addrs(), relay);
    directory
        .set_peer_addr_info(node_name, &info)
        .await
        .map_err(|source| TunnelError::Publish {
            node_name: node_name.to_string(),
            source,
        })?;
    Ok(info)
}
