//! Per-session ticket issuance, validation and rotation

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use rollcall_core::{RejectReason, RollcallError, RollcallResult, SessionId, Timestamp};
use rollcall_credential::{Ticket, TicketKey, TicketVerifier};

/// Outcome of checking a presented ticket
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Validation {
    /// Signature verified, time box open, bit-identical to the current ticket
    Valid(Ticket),
    /// Rejected; the reason is an expected outcome, not a failure
    Invalid(RejectReason),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }
}

/// Versioned ticket slot for one session.
///
/// The version counts committed mints/rotations; concurrent rotations race
/// on the write lock and the last one to commit wins.
#[derive(Debug, Default)]
struct TicketSlot {
    version: u64,
    current: Option<Ticket>,
}

/// Ticket authority - exclusive owner of every session's current ticket
pub struct TicketAuthority {
    key: TicketKey,
    verifier: TicketVerifier,
    sessions: RwLock<HashMap<SessionId, Arc<RwLock<TicketSlot>>>>,
}

impl TicketAuthority {
    pub fn new(key: TicketKey) -> Self {
        let verifier = key.verifier();
        TicketAuthority {
            key,
            verifier,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Verification-only half of the issuing key
    pub fn verifier(&self) -> TicketVerifier {
        self.verifier.clone()
    }

    /// Register a session so tickets can be minted for it
    pub fn open(&self, session: SessionId) -> RollcallResult<()> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&session) {
            return Err(RollcallError::SessionAlreadyOpen(session));
        }
        sessions.insert(session, Arc::new(RwLock::new(TicketSlot::default())));
        Ok(())
    }

    /// Deregister a session; its tickets can no longer validate
    pub fn close(&self, session: SessionId) -> RollcallResult<()> {
        self.sessions
            .write()
            .remove(&session)
            .map(|_| ())
            .ok_or(RollcallError::SessionNotFound(session))
    }

    /// Seal a fresh ticket for a session without installing it.
    ///
    /// The prepared ticket validates as `NotCurrent` until `commit`, so
    /// callers can stage side effects (rendering, publication) and only
    /// supersede the live ticket once those cannot fail.
    pub fn prepare(
        &self,
        session: SessionId,
        ttl: Duration,
        now: Timestamp,
    ) -> RollcallResult<Ticket> {
        self.slot(session)?;
        Ok(Ticket::seal(session, now, now + ttl, &self.key))
    }

    /// Install a prepared ticket as the session's current ticket.
    ///
    /// Overwrites any prior current ticket, implicitly invalidating it.
    /// Returns the new slot version.
    pub fn commit(&self, ticket: &Ticket) -> RollcallResult<u64> {
        let slot = self.slot(ticket.session)?;

        let mut slot = slot.write();
        slot.version += 1;
        slot.current = Some(ticket.clone());
        tracing::debug!(
            session = %ticket.session,
            version = slot.version,
            expires_at = ticket.expires_at.as_micros(),
            "ticket committed"
        );
        Ok(slot.version)
    }

    /// Mint a fresh ticket and immediately install it as current
    pub fn mint(&self, session: SessionId, ttl: Duration, now: Timestamp) -> RollcallResult<Ticket> {
        let ticket = self.prepare(session, ttl, now)?;
        self.commit(&ticket)?;
        Ok(ticket)
    }

    /// Check a presented ticket string against the session's current ticket.
    ///
    /// Signature and expiry are checked before the identity comparison, so a
    /// forged ticket reports `BadSignature` rather than leaking `NotCurrent`.
    /// A malformed string fails closed as `BadSignature` too.
    pub fn validate(
        &self,
        session: SessionId,
        presented: &str,
        now: Timestamp,
    ) -> RollcallResult<Validation> {
        let slot = self.slot(session)?;

        let ticket = match Ticket::decode(presented, &self.verifier) {
            Ok(ticket) => ticket,
            Err(_) => return Ok(Validation::Invalid(RejectReason::BadSignature)),
        };

        if ticket.expires_at.has_expired(now) {
            return Ok(Validation::Invalid(RejectReason::Expired));
        }

        if ticket.session != session {
            return Ok(Validation::Invalid(RejectReason::WrongSession));
        }

        let slot = slot.read();
        match &slot.current {
            Some(current) if *current == ticket => Ok(Validation::Valid(ticket)),
            _ => Ok(Validation::Invalid(RejectReason::NotCurrent)),
        }
    }

    /// Current ticket for a session, if one has been minted
    pub fn current(&self, session: SessionId) -> RollcallResult<Option<Ticket>> {
        let slot = self.slot(session)?;
        let slot = slot.read();
        Ok(slot.current.clone())
    }

    /// Committed rotation count for a session
    pub fn version(&self, session: SessionId) -> RollcallResult<u64> {
        let slot = self.slot(session)?;
        let slot = slot.read();
        Ok(slot.version)
    }

    /// Whether a session is registered
    pub fn is_open(&self, session: SessionId) -> bool {
        self.sessions.read().contains_key(&session)
    }

    fn slot(&self, session: SessionId) -> RollcallResult<Arc<RwLock<TicketSlot>>> {
        self.sessions
            .read()
            .get(&session)
            .cloned()
            .ok_or(RollcallError::SessionNotFound(session))
    }
}

impl std::fmt::Debug for TicketAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketAuthority")
            .field("key", &self.key)
            .field("sessions", &self.sessions.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(30);

    fn open_authority(session: SessionId) -> TicketAuthority {
        let authority = TicketAuthority::new(TicketKey::generate());
        authority.open(session).unwrap();
        authority
    }

    #[test]
    fn test_mint_installs_current() {
        let session = SessionId::new(1);
        let authority = open_authority(session);
        let now = Timestamp::from_micros(0);

        let ticket = authority.mint(session, TTL, now).unwrap();
        assert_eq!(authority.current(session).unwrap(), Some(ticket.clone()));
        assert_eq!(authority.version(session).unwrap(), 1);

        let validation = authority.validate(session, &ticket.encode(), now).unwrap();
        assert_eq!(validation, Validation::Valid(ticket));
    }

    #[test]
    fn test_rotation_supersedes_permanently() {
        let session = SessionId::new(2);
        let authority = open_authority(session);
        let now = Timestamp::from_micros(0);

        let t1 = authority.mint(session, TTL, now).unwrap();
        let t2 = authority.mint(session, TTL, now).unwrap();

        assert_eq!(
            authority.validate(session, &t1.encode(), now).unwrap(),
            Validation::Invalid(RejectReason::NotCurrent)
        );
        assert!(authority.validate(session, &t2.encode(), now).unwrap().is_valid());
        assert_eq!(authority.version(session).unwrap(), 2);
    }

    #[test]
    fn test_prepared_ticket_not_current_until_committed() {
        let session = SessionId::new(11);
        let authority = open_authority(session);
        let now = Timestamp::from_micros(0);
        let live = authority.mint(session, TTL, now).unwrap();

        let staged = authority.prepare(session, TTL, now).unwrap();
        assert_eq!(
            authority.validate(session, &staged.encode(), now).unwrap(),
            Validation::Invalid(RejectReason::NotCurrent)
        );
        assert_eq!(authority.current(session).unwrap(), Some(live.clone()));
        assert_eq!(authority.version(session).unwrap(), 1);
        assert!(authority.validate(session, &live.encode(), now).unwrap().is_valid());

        let version = authority.commit(&staged).unwrap();
        assert_eq!(version, 2);
        assert!(authority.validate(session, &staged.encode(), now).unwrap().is_valid());
        assert_eq!(
            authority.validate(session, &live.encode(), now).unwrap(),
            Validation::Invalid(RejectReason::NotCurrent)
        );
    }

    #[test]
    fn test_commit_requires_open_session() {
        let session = SessionId::new(12);
        let authority = open_authority(session);
        let staged = authority
            .prepare(session, TTL, Timestamp::from_micros(0))
            .unwrap();

        authority.close(session).unwrap();
        assert!(matches!(
            authority.commit(&staged),
            Err(RollcallError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_forged_ticket_reports_bad_signature() {
        let session = SessionId::new(3);
        let authority = open_authority(session);
        let now = Timestamp::from_micros(0);
        authority.mint(session, TTL, now).unwrap();

        // Signed by a different key: must not leak NotCurrent
        let forged = Ticket::seal(session, now, now + TTL, &TicketKey::generate());
        assert_eq!(
            authority.validate(session, &forged.encode(), now).unwrap(),
            Validation::Invalid(RejectReason::BadSignature)
        );
    }

    #[test]
    fn test_malformed_string_fails_closed() {
        let session = SessionId::new(4);
        let authority = open_authority(session);
        let now = Timestamp::from_micros(0);
        authority.mint(session, TTL, now).unwrap();

        assert_eq!(
            authority.validate(session, "zz-not-a-ticket", now).unwrap(),
            Validation::Invalid(RejectReason::BadSignature)
        );
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let session = SessionId::new(5);
        let authority = open_authority(session);
        let minted_at = Timestamp::from_micros(0);

        let ticket = authority.mint(session, TTL, minted_at).unwrap();
        let encoded = ticket.encode();

        let just_before = Timestamp::from_micros(ticket.expires_at.as_micros() - 1);
        assert!(authority.validate(session, &encoded, just_before).unwrap().is_valid());

        let at_expiry = ticket.expires_at;
        assert_eq!(
            authority.validate(session, &encoded, at_expiry).unwrap(),
            Validation::Invalid(RejectReason::Expired)
        );
    }

    #[test]
    fn test_wrong_session_detected() {
        let a = SessionId::new(6);
        let b = SessionId::new(7);
        let authority = TicketAuthority::new(TicketKey::generate());
        authority.open(a).unwrap();
        authority.open(b).unwrap();
        let now = Timestamp::from_micros(0);

        let ticket_a = authority.mint(a, TTL, now).unwrap();
        authority.mint(b, TTL, now).unwrap();

        assert_eq!(
            authority.validate(b, &ticket_a.encode(), now).unwrap(),
            Validation::Invalid(RejectReason::WrongSession)
        );
    }

    #[test]
    fn test_unknown_session_errors() {
        let authority = TicketAuthority::new(TicketKey::generate());
        let missing = SessionId::new(99);

        assert!(matches!(
            authority.mint(missing, TTL, Timestamp::ZERO),
            Err(RollcallError::SessionNotFound(_))
        ));
        assert!(matches!(
            authority.validate(missing, "anything", Timestamp::ZERO),
            Err(RollcallError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_double_open_rejected() {
        let session = SessionId::new(8);
        let authority = open_authority(session);

        assert!(matches!(
            authority.open(session),
            Err(RollcallError::SessionAlreadyOpen(_))
        ));
    }

    #[test]
    fn test_close_invalidates_session() {
        let session = SessionId::new(9);
        let authority = open_authority(session);
        let now = Timestamp::from_micros(0);
        let ticket = authority.mint(session, TTL, now).unwrap();

        authority.close(session).unwrap();
        assert!(matches!(
            authority.validate(session, &ticket.encode(), now),
            Err(RollcallError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_concurrent_rotations_last_commit_wins() {
        let session = SessionId::new(10);
        let authority = Arc::new(open_authority(session));
        let now = Timestamp::from_micros(0);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let authority = Arc::clone(&authority);
                std::thread::spawn(move || authority.mint(session, TTL, now).unwrap())
            })
            .collect();
        let minted: Vec<Ticket> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(authority.version(session).unwrap(), 8);

        // Exactly one of the racing tickets is current; the rest are stale.
        let current = authority.current(session).unwrap().unwrap();
        assert_eq!(minted.iter().filter(|t| **t == current).count(), 1);
        for ticket in &minted {
            let validation = authority.validate(session, &ticket.encode(), now).unwrap();
            if *ticket == current {
                assert!(validation.is_valid());
            } else {
                assert_eq!(validation, Validation::Invalid(RejectReason::NotCurrent));
            }
        }
    }
}
