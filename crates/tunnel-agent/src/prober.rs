//! Connection probe. Purely observational, recomputed every cycle since
//! transport connections can drop silently between cycles.

use tunnel_transport::PeerId;

use crate::host::Host;

/// Whether at least one established connection to `peer` exists.
pub async fn has_connection<H: Host + ?Sized>(host: &H, peer: &PeerId) -> bool {
    !host.conns_to_peer(peer).await.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::{peer, MockHost};

    #[tokio::test]
    async fn reflects_current_connections() {
        let host = MockHost::new(peer(1), vec![]);
        let relay = peer(2);

        assert!(!has_connection(&host, &relay).await);
        host.set_connected(relay);
        assert!(has_connection(&host, &relay).await);
        host.drop_connections();
        assert!(!has_connection(&host, &relay).await);
        assert_eq!(host.probes().len(), 3);
    }
}
