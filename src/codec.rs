//! Wire codec: length-prefixed reliable framing, self-delimiting datagram
//! framing, and the postcard body encoding shared by both.
//!
//! Reliable frame: `[u32 len LE][u32 id_len LE][ascii id][body]`, where `len`
//! counts everything after itself (`id_len` field + id bytes + body).
//!
//! Datagram frame: `[u32 id_len LE][ascii id][16-byte session id][body]`,
//! capped at 1200 bytes total.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::error::ErrorKind;

pub const SESSION_ID_LEN: usize = 16;
pub const MAX_DATAGRAM_BYTES: usize = 1200;

/// Serialize a typed body with the canonical body encoding (postcard).
pub fn encode_body<T: Serialize>(value: &T) -> Result<Vec<u8>, ErrorKind> {
    postcard::to_allocvec(value).map_err(|_| ErrorKind::DecodeFailed)
}

/// Deserialize a typed body with the canonical body encoding (postcard).
pub fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ErrorKind> {
    postcard::from_bytes(bytes).map_err(|_| ErrorKind::DecodeFailed)
}

/// Build a complete reliable frame for `id` + an already-encoded body.
pub fn encode_reliable_frame(id: &str, body: &[u8]) -> Bytes {
    let id_bytes = id.as_bytes();
    let inner_len = 4 + id_bytes.len() + body.len();
    let mut buf = BytesMut::with_capacity(4 + inner_len);
    buf.put_u32_le(inner_len as u32);
    buf.put_u32_le(id_bytes.len() as u32);
    buf.put_slice(id_bytes);
    buf.put_slice(body);
    buf.freeze()
}

/// Parsed view over a reliable frame's payload (after the outer length prefix
/// has already been read and the exact-length buffer filled).
pub struct ReliableFrame<'a> {
    pub id: &'a str,
    pub body: &'a [u8],
}

/// Parse the inner contents of a reliable frame (`id_len`/id/body), given the
/// exact-length buffer a caller already read using the outer `u32` length.
pub fn parse_reliable_payload(mut buf: &[u8]) -> Result<ReliableFrame<'_>, ErrorKind> {
    if buf.len() < 4 {
        return Err(ErrorKind::FrameTruncated);
    }
    let id_len = buf.get_u32_le() as usize;
    if buf.len() < id_len {
        return Err(ErrorKind::FrameTruncated);
    }
    let (id_bytes, rest) = buf.split_at(id_len);
    let id = std::str::from_utf8(id_bytes).map_err(|_| ErrorKind::ProtocolViolation)?;
    Ok(ReliableFrame { id, body: rest })
}

/// Build a complete datagram frame for `id` + session id + an already-encoded
/// body. Returns `FrameTooLarge` if the assembled datagram would exceed
/// [`MAX_DATAGRAM_BYTES`].
pub fn encode_datagram(id: &str, session_id: Uuid, body: &[u8]) -> Result<Bytes, ErrorKind> {
    let id_bytes = id.as_bytes();
    let total = 4 + id_bytes.len() + SESSION_ID_LEN + body.len();
    if total > MAX_DATAGRAM_BYTES {
        return Err(ErrorKind::FrameTooLarge);
    }
    let mut buf = BytesMut::with_capacity(total);
    buf.put_u32_le(id_bytes.len() as u32);
    buf.put_slice(id_bytes);
    buf.put_slice(session_id.as_bytes());
    buf.put_slice(body);
    Ok(buf.freeze())
}

/// Parsed view over a raw datagram.
pub struct DatagramFrame<'a> {
    pub id: &'a str,
    pub session_id: Uuid,
    pub body: &'a [u8],
}

/// Parse a raw datagram received from the socket.
pub fn parse_datagram(mut buf: &[u8]) -> Result<DatagramFrame<'_>, ErrorKind> {
    if buf.len() > MAX_DATAGRAM_BYTES {
        return Err(ErrorKind::FrameTooLarge);
    }
    if buf.len() < 4 {
        return Err(ErrorKind::FrameTruncated);
    }
    let id_len = buf.get_u32_le() as usize;
    if buf.len() < id_len + SESSION_ID_LEN {
        return Err(ErrorKind::FrameTruncated);
    }
    let (id_bytes, rest) = buf.split_at(id_len);
    let id = std::str::from_utf8(id_bytes).map_err(|_| ErrorKind::ProtocolViolation)?;
    let (session_bytes, body) = rest.split_at(SESSION_ID_LEN);
    let session_id = Uuid::from_slice(session_bytes).map_err(|_| ErrorKind::ProtocolViolation)?;
    Ok(DatagramFrame {
        id,
        session_id,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Ping {
        seq: u32,
    }

    #[test]
    fn reliable_frame_round_trips() {
        let body = encode_body(&Ping { seq: 7 }).unwrap();
        let frame = encode_reliable_frame("PingRequest", &body);
        // Strip the outer u32 length the transport reads separately.
        let inner = &frame[4..];
        let parsed = parse_reliable_payload(inner).unwrap();
        assert_eq!(parsed.id, "PingRequest");
        let decoded: Ping = decode_body(parsed.body).unwrap();
        assert_eq!(decoded, Ping { seq: 7 });
    }

    #[test]
    fn datagram_round_trips() {
        let session = Uuid::new_v4();
        let body = encode_body(&Ping { seq: 99 }).unwrap();
        let datagram = encode_datagram("PlayerPositionUpdate", session, &body).unwrap();
        let parsed = parse_datagram(&datagram).unwrap();
        assert_eq!(parsed.id, "PlayerPositionUpdate");
        assert_eq!(parsed.session_id, session);
        let decoded: Ping = decode_body(parsed.body).unwrap();
        assert_eq!(decoded, Ping { seq: 99 });
    }

    #[test]
    fn datagram_over_limit_rejected() {
        let session = Uuid::new_v4();
        let body = vec![0u8; MAX_DATAGRAM_BYTES];
        assert!(matches!(
            encode_datagram("Huge", session, &body),
            Err(ErrorKind::FrameTooLarge)
        ));
    }

    #[test]
    fn truncated_reliable_payload_rejected() {
        assert!(matches!(
            parse_reliable_payload(&[0, 0]),
            Err(ErrorKind::FrameTruncated)
        ));
    }
}
