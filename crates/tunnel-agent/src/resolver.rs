//! Relay address resolution.

use tunnel_transport::PeerAddrInfo;

use crate::directory::PeerDirectory;
use crate::error::TunnelError;

/// Look up the relay's current record under `relay_name`.
///
/// A record without addresses is treated like a missing one: the relay's
/// location is not known yet.
pub async fn resolve_relay<D: PeerDirectory + ?Sized>(
    directory: &D,
    relay_name: &str,
) -> Result<PeerAddrInfo, TunnelError> {
    let relay = directory
        .get_peer_addr_info(relay_name)
        .await
        .map_err(|source| TunnelError::Resolution {
            name: relay_name.to_string(),
            source,
        })?;

    if relay.is_empty() {
        return Err(TunnelError::EmptyRecord {
            name: relay_name.to_string(),
        });
    }
    Ok(relay)
}
