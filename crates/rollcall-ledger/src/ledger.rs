//! Idempotent presence recording

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use rollcall_core::{ParticipantId, PresenceRecord, SessionId, Timestamp};

/// Outcome of a recording attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First recording for this `(session, participant)` pair
    Recorded(PresenceRecord),
    /// Pair already present; carries the original record so callers can
    /// echo the first-marked time
    AlreadyRecorded(PresenceRecord),
}

impl RecordOutcome {
    pub fn is_new(&self) -> bool {
        matches!(self, RecordOutcome::Recorded(_))
    }

    pub fn record(&self) -> &PresenceRecord {
        match self {
            RecordOutcome::Recorded(record) | RecordOutcome::AlreadyRecorded(record) => record,
        }
    }
}

/// Per-session presence state.
///
/// `seen` and `records` are only touched together under the session mutex,
/// so membership and append order cannot diverge.
#[derive(Debug, Default)]
struct SessionLedger {
    seen: HashSet<ParticipantId>,
    records: Vec<PresenceRecord>,
}

/// Idempotent, append-only presence ledger
#[derive(Debug, Default)]
pub struct PresenceLedger {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<SessionLedger>>>>,
}

impl PresenceLedger {
    pub fn new() -> Self {
        PresenceLedger::default()
    }

    /// Atomic check-and-insert for `(session, participant)`.
    ///
    /// Under concurrent calls for the same pair, exactly one caller observes
    /// `Recorded`; every other caller observes `AlreadyRecorded` with the
    /// winning record. Never a read-then-write across the lock.
    pub fn try_record(
        &self,
        session: SessionId,
        participant: ParticipantId,
        at: Timestamp,
    ) -> RecordOutcome {
        let ledger = self.session_ledger(session);
        let mut ledger = ledger.lock();

        if !ledger.seen.insert(participant) {
            // HashSet::insert already told us the pair exists; the original
            // record is in the append log.
            let existing = ledger
                .records
                .iter()
                .find(|r| r.participant == participant)
                .copied()
                .unwrap_or(PresenceRecord::new(session, participant, at));
            return RecordOutcome::AlreadyRecorded(existing);
        }

        let record = PresenceRecord::new(session, participant, at);
        ledger.records.push(record);
        tracing::debug!(session = %session, participant = %participant, "presence recorded");
        RecordOutcome::Recorded(record)
    }

    /// All records for a session, ordered by `recorded_at` ascending.
    pub fn list_for_session(&self, session: SessionId) -> Vec<PresenceRecord> {
        let Some(ledger) = self.sessions.read().get(&session).cloned() else {
            return Vec::new();
        };
        let mut records = {
            let ledger = ledger.lock();
            ledger.records.clone()
        };
        // Append order already matches recording order when callers take
        // their timestamp before inserting; the stable sort covers skewed
        // caller clocks.
        records.sort_by_key(|r| r.recorded_at);
        records
    }

    /// Number of participants recorded for a session
    pub fn count_for_session(&self, session: SessionId) -> usize {
        self.sessions
            .read()
            .get(&session)
            .map(|ledger| ledger.lock().records.len())
            .unwrap_or(0)
    }

    /// Whether a pair has already been recorded
    pub fn is_recorded(&self, session: SessionId, participant: ParticipantId) -> bool {
        self.sessions
            .read()
            .get(&session)
            .map(|ledger| ledger.lock().seen.contains(&participant))
            .unwrap_or(false)
    }

    fn session_ledger(&self, session: SessionId) -> Arc<Mutex<SessionLedger>> {
        if let Some(ledger) = self.sessions.read().get(&session) {
            return Arc::clone(ledger);
        }
        let mut sessions = self.sessions.write();
        Arc::clone(sessions.entry(session).or_default())
    }
}
