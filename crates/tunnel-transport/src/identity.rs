//! Node identities: Ed25519 keypairs and the libp2p peer ids derived from them.
pub use libp2p_identity::{Keypair, PeerId};

use crate::TransportError;

/// Build the keypair for a fixed 32-byte Ed25519 secret seed.
pub fn keypair_from_seed(seed: [u8; 32]) -> Result<Keypair, TransportError> {
    Keypair::ed25519_from_bytes(seed).map_err(|e| TransportError::InvalidIdentity(e.to_string()))
}

/// Peer id belonging to a fixed secret seed.
pub fn peer_id_from_seed(seed: [u8; 32]) -> Result<PeerId, TransportError> {
    Ok(keypair_from_seed(seed)?.public().to_peer_id())
}
