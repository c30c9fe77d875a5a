//! Issuing keys for session tickets
//!
//! A ticket key can endorse exactly one thing: a [`TicketBody`]. Keeping
//! the signing surface typed means no caller can coax the host's key into
//! signing arbitrary bytes, and the endorse/verify pair stays private to
//! this crate's codec boundary.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::codec::{TicketBody, SIGNATURE_SIZE};

/// Ed25519 key held by the ticket-issuing host
#[derive(Clone)]
pub struct TicketKey {
    secret: SigningKey,
    fingerprint: u64,
}

impl TicketKey {
    /// Generate a fresh random key
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Restore a key previously persisted to a key store
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(bytes))
    }

    /// Secret bytes for persisting to a key store
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    /// Short key fingerprint for logs
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Verification-only half of this key
    pub fn verifier(&self) -> TicketVerifier {
        TicketVerifier {
            public: self.secret.verifying_key(),
            fingerprint: self.fingerprint,
        }
    }

    /// Endorse a ticket body. Only the codec mints tickets, so the raw
    /// signature never leaves this crate.
    pub(crate) fn endorse(&self, body: &TicketBody) -> [u8; SIGNATURE_SIZE] {
        self.secret.sign(&body.to_bytes()).to_bytes()
    }

    fn from_signing_key(secret: SigningKey) -> Self {
        let fingerprint = fingerprint_of(&secret.verifying_key());
        TicketKey {
            secret,
            fingerprint,
        }
    }
}

impl std::fmt::Debug for TicketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TicketKey({:016x})", self.fingerprint)
    }
}

/// Public half of a ticket key. This is what scan validators hold; it can
/// check endorsements but never mint.
#[derive(Clone)]
pub struct TicketVerifier {
    public: VerifyingKey,
    fingerprint: u64,
}

impl TicketVerifier {
    /// Reconstruct from public key bytes shared by the issuing host
    pub fn from_public_bytes(bytes: &[u8; 32]) -> Option<Self> {
        let public = VerifyingKey::from_bytes(bytes).ok()?;
        let fingerprint = fingerprint_of(&public);
        Some(TicketVerifier {
            public,
            fingerprint,
        })
    }

    /// Public key bytes for sharing with scan validators
    pub fn public_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// Short key fingerprint for logs
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Whether `signature` is this key's endorsement of `body`
    pub(crate) fn endorsed(&self, body: &TicketBody, signature: &[u8; SIGNATURE_SIZE]) -> bool {
        let signature = Signature::from_bytes(signature);
        self.public.verify(&body.to_bytes(), &signature).is_ok()
    }
}

impl std::fmt::Debug for TicketVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TicketVerifier({:016x})", self.fingerprint)
    }
}

fn fingerprint_of(public: &VerifyingKey) -> u64 {
    let digest = Sha256::digest(public.as_bytes());
    let bytes: [u8; 8] = digest[..8].try_into().unwrap_or([0u8; 8]);
    u64::from_le_bytes(bytes)
}
