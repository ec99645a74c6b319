//! Length-prefixed framing.
//!
//! Every message on the wire is a 4-byte big-endian length followed by
//! exactly that many payload bytes. The framing layer knows nothing about
//! what the payload contains.

use std::io::ErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::TransportError;

/// Largest payload accepted in either direction.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Reads one frame.
///
/// Returns `Ok(None)` when the stream ends cleanly on a frame boundary.
/// A stream that ends inside a frame is a receive failure, and a length
/// prefix of zero or above [`MAX_FRAME_LEN`] is a malformed frame.
pub async fn read_frame<R>(
    reader: &mut R,
) -> Result<Option<Vec<u8>>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len,
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(TransportError::ReceiveFailed(e)),
    };

    if len == 0 || len as usize > MAX_FRAME_LEN {
        return Err(TransportError::MalformedFrame(len));
    }

    let mut body = vec![0u8; len as usize];
    reader
        .read_exact(&mut body)
        .await
        .map_err(TransportError::ReceiveFailed)?;
    Ok(Some(body))
}

/// Writes one frame and flushes it.
pub async fn write_frame<W>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    if payload.is_empty() || payload.len() > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge(payload.len()));
    }

    // Prefix and body go out in one write so a concurrent reader on the
    // other end never observes a split header.
    let mut buf = Vec::with_capacity(4 + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);

    writer
        .write_all(&buf)
        .await
        .map_err(TransportError::SendFailed)?;
    writer.flush().await.map_err(TransportError::SendFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frame_round_trip_over_duplex() {
        let (mut a, mut b) = tokio::io::duplex(1024);
        write_frame(&mut a, br#"{"cmd":"RESPAWN"}"#).await.unwrap();
        let got = read_frame(&mut b).await.unwrap().unwrap();
        assert_eq!(got, br#"{"cmd":"RESPAWN"}"#);
    }

    #[tokio::test]
    async fn test_prefix_is_big_endian() {
        let (mut a, mut b) = tokio::io::duplex(1024);
        write_frame(&mut a, b"abc").await.unwrap();
        let mut raw = [0u8; 7];
        b.read_exact(&mut raw).await.unwrap();
        assert_eq!(raw, [0, 0, 0, 3, b'a', b'b', b'c']);
    }

    #[tokio::test]
    async fn test_clean_eof_returns_none() {
        let (a, mut b) = tokio::io::duplex(64);
        drop(a);
        assert!(read_frame(&mut b).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_zero_length_is_malformed() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_all(&0u32.to_be_bytes()).await.unwrap();
        let err = read_frame(&mut b).await.unwrap_err();
        assert!(matches!(err, TransportError::MalformedFrame(0)));
    }

    #[tokio::test]
    async fn test_oversized_length_is_malformed() {
        let (mut a, mut b) = tokio::io::duplex(64);
        let len = (MAX_FRAME_LEN as u32) + 1;
        a.write_all(&len.to_be_bytes()).await.unwrap();
        let err = read_frame(&mut b).await.unwrap_err();
        assert!(matches!(err, TransportError::MalformedFrame(l) if l == len));
    }

    #[tokio::test]
    async fn test_eof_inside_body_is_receive_failure() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_all(&10u32.to_be_bytes()).await.unwrap();
        a.write_all(b"short").await.unwrap();
        drop(a);
        let err = read_frame(&mut b).await.unwrap_err();
        assert!(matches!(err, TransportError::ReceiveFailed(_)));
    }

    #[tokio::test]
    async fn test_empty_payload_is_rejected_on_write() {
        let (mut a, _b) = tokio::io::duplex(64);
        let err = write_frame(&mut a, b"").await.unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge(0)));
    }
}
