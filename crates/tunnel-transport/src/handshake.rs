//! Hello exchange run on every new TCP connection.
//!
//! Frame: 4-byte big-endian length, then `HELLO_TAG` followed by the
//! sender's peer id in its binary multihash form. The dialer speaks first.
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{PeerId, TransportError};

const HELLO_TAG: &[u8] = b"tunnel/hello/1";

/// Write a length-prefixed frame.
pub(crate) async fn write_framed<W: AsyncWrite + Unpin>(
    w: &mut W,
    data: &[u8],
) -> std::io::Result<()> {
    let len = (data.len() as u32).to_be_bytes();
    w.write_all(&len).await?;
    w.write_all(data).await?;
    w.flush().await
}

/// Read a length-prefixed frame of at most `max_size` bytes.
pub(crate) async fn read_framed<R: AsyncRead + Unpin>(
    r: &mut R,
    max_size: usize,
) -> Result<Vec<u8>, String> {
    let mut len_buf = [0u8; 4];
    r.read_exact(&mut len_buf)
        .await
        .map_err(|e| format!("read length: {e}"))?;

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_size {
        return Err(format!("frame too large: {len} bytes (max {max_size})"));
    }

    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)
        .await
        .map_err(|e| format!("read frame: {e}"))?;
    Ok(buf)
}

fn encode_hello(id: &PeerId) -> Vec<u8> {
    let mut buf = HELLO_TAG.to_vec();
    buf.extend_from_slice(&id.to_bytes());
    buf
}

fn decode_hello(frame: &[u8]) -> Result<PeerId, String> {
    let id = frame
        .strip_prefix(HELLO_TAG)
        .ok_or_else(|| "unexpected protocol tag".to_string())?;
    PeerId::from_bytes(id).map_err(|e| format!("bad identity: {e}"))
}

/// Dialer side: announce ourselves, then require `expected` to answer.
pub(crate) async fn dialer_hello<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    local: &PeerId,
    expected: &PeerId,
    max_size: usize,
    addr: &str,
) -> Result<(), TransportError> {
    let handshake = |reason: String| TransportError::Handshake {
        addr: addr.to_string(),
        reason,
    };

    write_framed(stream, &encode_hello(local))
        .await
        .map_err(|e| handshake(format!("write hello: {e}")))?;
    let frame = read_framed(stream, max_size).await.map_err(handshake)?;
    let actual = decode_hello(&frame).map_err(handshake)?;

    if actual != *expected {
        return Err(TransportError::PeerMismatch {
            expected: *expected,
            actual,
        });
    }
    Ok(())
}

/// Acceptor side: learn who dialed, then answer with our identity.
pub(crate) async fn acceptor_hello<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    local: &PeerId,
    max_size: usize,
    addr: &str,
) -> Result<PeerId, TransportError> {
    let handshake = |reason: String| TransportError::Handshake {
        addr: addr.to_string(),
        reason,
    };

    let frame = read_framed(stream, max_size).await.map_err(handshake)?;
    let remote = decode_hello(&frame).map_err(handshake)?;
    write_framed(stream, &encode_hello(local))
        .await
        .map_err(|e| handshake(format!("write hello: {e}")))?;
    Ok(remote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::peer_id_from_seed;

    fn peer(seed: u8) -> PeerId {
        peer_id_from_seed([seed; 32]).unwrap()
    }

    #[tokio::test]
    async fn hello_exchange_succeeds() {
        let (mut a, mut b) = tokio::io::duplex(256);
        let dialer = peer(1);
        let acceptor = peer(2);

        let accept = tokio::spawn(async move {
            acceptor_hello(&mut b, &acceptor, 1024, "test").await
        });
        dialer_hello(&mut a, &dialer, &acceptor, 1024, "test")
            .await
            .unwrap();
        assert_eq!(accept.await.unwrap().unwrap(), dialer);
    }

    #[tokio::test]
    async fn dialer_rejects_unexpected_identity() {
        let (mut a, mut b) = tokio::io::duplex(256);
        let dialer = peer(1);
        let impostor = peer(3);
        let expected = peer(2);

        tokio::spawn(async move {
            let _ = acceptor_hello(&mut b, &impostor, 1024, "test").await;
        });
        let err = dialer_hello(&mut a, &dialer, &expected, 1024, "test")
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::PeerMismatch { actual, .. } if actual == impostor));
    }

    #[tokio::test]
    async fn oversized_frame_rejected() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        write_framed(&mut a, &[0u8; 2048]).await.unwrap();
        let err = read_framed(&mut b, 1024).await.unwrap_err();
        assert!(err.contains("too large"));
    }

    #[test]
    fn hello_frame_round_trips() {
        assert_eq!(decode_hello(&encode_hello(&peer(4))).unwrap(), peer(4));
    }

    #[test]
    fn decode_rejects_wrong_tag() {
        let mut frame = b"other/hello/1".to_vec();
        frame.extend_from_slice(&peer(1).to_bytes());
        assert!(decode_hello(&frame).is_err());
    }

    #[test]
    fn decode_rejects_garbage_identity() {
        let mut frame = HELLO_TAG.to_vec();
        frame.extend_from_slice(&[0xff; 16]);
        assert!(decode_hello(&frame).unwrap_err().contains("bad identity"));
    }
}
