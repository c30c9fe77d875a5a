//! Ticket wire form
//!
//! Payload = session(8) || issued_at(8) || expires_at(8) || nonce(8), all
//! little endian, followed by a 64-byte Ed25519 signature over the payload.
//! The encoded form is lowercase hex of payload + signature.
//!
//! Decoding fails closed: any bit flip in payload or signature yields an
//! error, never a partial parse. The nonce makes two tickets minted for the
//! same session and instant distinct, so "bit-identical to the current
//! ticket" is a meaningful comparison.

use rand::RngCore;

use rollcall_core::{RollcallError, RollcallResult, SessionId, Timestamp};

use crate::{TicketKey, TicketVerifier};

/// Signed payload size
pub const PAYLOAD_SIZE: usize = 32;

/// Ed25519 signature size
pub const SIGNATURE_SIZE: usize = 64;

/// Total ticket size before hex encoding
pub const TICKET_SIZE: usize = PAYLOAD_SIZE + SIGNATURE_SIZE;

/// Length of the encoded ticket string
pub const ENCODED_LEN: usize = TICKET_SIZE * 2;

/// Unsigned ticket fields, the exact thing a [`TicketKey`] endorses
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TicketBody {
    pub session: SessionId,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub nonce: u64,
}

impl TicketBody {
    /// Canonical wire bytes, signed as-is
    pub fn to_bytes(self) -> [u8; PAYLOAD_SIZE] {
        let mut buf = [0u8; PAYLOAD_SIZE];
        buf[0..8].copy_from_slice(&self.session.to_bytes());
        buf[8..16].copy_from_slice(&self.issued_at.to_bytes());
        buf[16..24].copy_from_slice(&self.expires_at.to_bytes());
        buf[24..32].copy_from_slice(&self.nonce.to_le_bytes());
        buf
    }

    fn from_bytes(bytes: &[u8; PAYLOAD_SIZE]) -> Self {
        TicketBody {
            session: SessionId::from_bytes(bytes[0..8].try_into().unwrap_or([0u8; 8])),
            issued_at: Timestamp::from_bytes(bytes[8..16].try_into().unwrap_or([0u8; 8])),
            expires_at: Timestamp::from_bytes(bytes[16..24].try_into().unwrap_or([0u8; 8])),
            nonce: u64::from_le_bytes(bytes[24..32].try_into().unwrap_or([0u8; 8])),
        }
    }
}

/// Signed, time-boxed session ticket
///
/// Equality covers every field including nonce and signature, so `==` is
/// the bit-identity comparison the authority uses against its current slot.
#[derive(Clone, PartialEq, Eq)]
pub struct Ticket {
    pub session: SessionId,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub nonce: u64,
    pub signature: [u8; SIGNATURE_SIZE],
}

impl Ticket {
    /// Mint a signed ticket with a fresh random nonce
    pub fn seal(
        session: SessionId,
        issued_at: Timestamp,
        expires_at: Timestamp,
        key: &TicketKey,
    ) -> Self {
        let nonce = rand::rngs::OsRng.next_u64();
        Self::seal_with_nonce(session, issued_at, expires_at, nonce, key)
    }

    /// Mint with an explicit nonce (deterministic, for tests)
    pub fn seal_with_nonce(
        session: SessionId,
        issued_at: Timestamp,
        expires_at: Timestamp,
        nonce: u64,
        key: &TicketKey,
    ) -> Self {
        let body = TicketBody {
            session,
            issued_at,
            expires_at,
            nonce,
        };
        let signature = key.endorse(&body);
        Ticket {
            session,
            issued_at,
            expires_at,
            nonce,
            signature,
        }
    }

    /// Unsigned fields of this ticket
    pub fn body(&self) -> TicketBody {
        TicketBody {
            session: self.session,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            nonce: self.nonce,
        }
    }

    /// Encode to the scannable string form
    pub fn encode(&self) -> String {
        let mut buf = [0u8; TICKET_SIZE];
        buf[..PAYLOAD_SIZE].copy_from_slice(&self.body().to_bytes());
        buf[PAYLOAD_SIZE..].copy_from_slice(&self.signature);
        hex::encode(buf)
    }

    /// Decode and verify a presented ticket string.
    ///
    /// Fails closed on malformed hex, wrong length, or signature mismatch.
    pub fn decode(encoded: &str, verifier: &TicketVerifier) -> RollcallResult<Self> {
        let bytes = hex::decode(encoded).map_err(|_| RollcallError::InvalidEncoding)?;
        if bytes.len() != TICKET_SIZE {
            return Err(RollcallError::TruncatedPayload {
                expected: TICKET_SIZE,
                actual: bytes.len(),
            });
        }

        let payload: [u8; PAYLOAD_SIZE] = bytes[..PAYLOAD_SIZE]
            .try_into()
            .map_err(|_| RollcallError::InvalidEncoding)?;
        let signature: [u8; SIGNATURE_SIZE] = bytes[PAYLOAD_SIZE..]
            .try_into()
            .map_err(|_| RollcallError::InvalidEncoding)?;

        // Field decode is a lossless little-endian roundtrip, so checking
        // the endorsement against the re-encoded body covers the presented
        // payload bytes exactly.
        let body = TicketBody::from_bytes(&payload);
        if !verifier.endorsed(&body, &signature) {
            return Err(RollcallError::SignatureMismatch);
        }

        Ok(Ticket {
            session: body.session,
            issued_at: body.issued_at,
            expires_at: body.expires_at,
            nonce: body.nonce,
            signature,
        })
    }
}

impl std::fmt::Debug for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticket")
            .field("session", &self.session)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("nonce", &format_args!("{:016x}", self.nonce))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_ticket(key: &TicketKey) -> Ticket {
        Ticket::seal_with_nonce(
            SessionId::new(0x1234),
            Timestamp::from_micros(1_000_000),
            Timestamp::from_micros(31_000_000),
            0xCAFE,
            key,
        )
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let key = TicketKey::generate();
        let ticket = sample_ticket(&key);

        let encoded = ticket.encode();
        assert_eq!(encoded.len(), ENCODED_LEN);

        let decoded = Ticket::decode(&encoded, &key.verifier()).unwrap();
        assert_eq!(decoded, ticket);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let key = TicketKey::generate();
        let a = sample_ticket(&key);
        let b = sample_ticket(&key);

        assert_eq!(a.encode(), b.encode());
    }

    #[test]
    fn test_nonce_distinguishes_tickets() {
        let key = TicketKey::generate();
        let session = SessionId::new(7);
        let at = Timestamp::from_micros(500);
        let exp = Timestamp::from_micros(900);

        let a = Ticket::seal_with_nonce(session, at, exp, 1, &key);
        let b = Ticket::seal_with_nonce(session, at, exp, 2, &key);

        assert_ne!(a, b);
        assert_ne!(a.encode(), b.encode());
    }

    #[test]
    fn test_wrong_key_fails_closed() {
        let key = TicketKey::generate();
        let other = TicketKey::generate();
        let ticket = sample_ticket(&key);

        let err = Ticket::decode(&ticket.encode(), &other.verifier()).unwrap_err();
        assert!(matches!(err, RollcallError::SignatureMismatch));
    }

    #[test]
    fn test_non_hex_rejected() {
        let key = TicketKey::generate();
        let err = Ticket::decode("not hex at all!", &key.verifier()).unwrap_err();
        assert!(matches!(err, RollcallError::InvalidEncoding));
    }

    #[test]
    fn test_truncated_rejected() {
        let key = TicketKey::generate();
        let mut encoded = sample_ticket(&key).encode();
        encoded.truncate(ENCODED_LEN - 2);

        let err = Ticket::decode(&encoded, &key.verifier()).unwrap_err();
        assert!(matches!(err, RollcallError::TruncatedPayload { .. }));
    }

    proptest! {
        #[test]
        fn prop_any_byte_flip_fails_closed(position in 0usize..TICKET_SIZE, flip in 1u8..=255) {
            let key = TicketKey::generate();
            let ticket = sample_ticket(&key);

            let mut bytes = hex::decode(ticket.encode()).unwrap();
            bytes[position] ^= flip;
            let tampered = hex::encode(&bytes);

            prop_assert!(Ticket::decode(&tampered, &key.verifier()).is_err());
        }

        #[test]
        fn prop_roundtrip_preserves_fields(
            session in any::<u64>(),
            issued in any::<i64>(),
            expires in any::<i64>(),
            nonce in any::<u64>(),
        ) {
            let key = TicketKey::generate();
            let ticket = Ticket::seal_with_nonce(
                SessionId::new(session),
                Timestamp::from_micros(issued),
                Timestamp::from_micros(expires),
                nonce,
                &key,
            );

            let decoded = Ticket::decode(&ticket.encode(), &key.verifier()).unwrap();
            prop_assert_eq!(decoded, ticket);
        }
    }
}
