//! The marking orchestrator

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use thiserror::Error;

use rollcall_authority::{TicketAuthority, Validation};
use rollcall_bus::{EventBus, Observer};
use rollcall_core::{
    ImageArtifact, ParticipantId, PresenceRecord, RejectReason, RollcallError, SessionEvent,
    SessionId, Timestamp,
};
use rollcall_credential::{Ticket, TicketKey};
use rollcall_ledger::{PresenceLedger, RecordOutcome};

use crate::{Counters, EngineConfig, EngineStats, NullDirectory, ParticipantDirectory};

/// Everything a display surface needs to show the current ticket
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionDisplay {
    /// Raw encoded ticket string (for debugging and test harnesses)
    pub ticket: String,
    pub expires_at: Timestamp,
    /// Scan URL the QR encodes
    pub mark_url: String,
    /// Rendered QR artifact
    pub image: ImageArtifact,
}

/// Result of a scan request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    /// New presence fact; the session rotated to `next`
    Recorded {
        recorded_at: Timestamp,
        next: SessionDisplay,
    },
    /// Benign duplicate - the participant was already marked. No rotation,
    /// no fan-out.
    AlreadyMarked { first_recorded_at: Timestamp },
    /// Invalid ticket; zero side effects
    Rejected(RejectReason),
}

/// Failures surfaced to the transport caller.
///
/// Rejections and duplicates are not errors; they are `ScanOutcome`
/// variants. These are the genuinely exceptional cases.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("session already open: {0}")]
    SessionAlreadyOpen(SessionId),

    /// Infrastructure failure. Retries must re-enter the scan path from the
    /// top; the ledger's idempotence makes that safe.
    #[error("internal failure: {0}")]
    Internal(String),
}

impl From<RollcallError> for EngineError {
    fn from(err: RollcallError) -> Self {
        match err {
            RollcallError::SessionNotFound(session) => EngineError::SessionNotFound(session),
            RollcallError::SessionAlreadyOpen(session) => EngineError::SessionAlreadyOpen(session),
            other => EngineError::Internal(other.to_string()),
        }
    }
}

/// Roll-call engine: ticket authority + presence ledger + event bus wired
/// into the marking protocol
pub struct RollcallEngine {
    config: EngineConfig,
    authority: TicketAuthority,
    ledger: PresenceLedger,
    bus: EventBus,
    directory: Arc<dyn ParticipantDirectory>,
    /// Per-session fan-out locks: rotation and its two events commit as one
    /// unit in bus order, so every `TicketRotated` immediately follows its
    /// `PresenceRecorded`.
    fanout: RwLock<HashMap<SessionId, Arc<Mutex<()>>>>,
    counters: Counters,
}

impl RollcallEngine {
    /// Engine with a freshly generated signing key
    pub fn new(config: EngineConfig) -> Self {
        Self::with_key(config, TicketKey::generate())
    }

    /// Engine with an existing signing key (e.g. restored from a key store)
    pub fn with_key(config: EngineConfig, key: TicketKey) -> Self {
        let bus = EventBus::with_capacity(config.bus_capacity);
        RollcallEngine {
            config,
            authority: TicketAuthority::new(key),
            ledger: PresenceLedger::new(),
            bus,
            directory: Arc::new(NullDirectory),
            fanout: RwLock::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// Plug in the external identity collaborator for display names
    pub fn with_directory(mut self, directory: Arc<dyn ParticipantDirectory>) -> Self {
        self.directory = directory;
        self
    }

    /// Open a roll-call session: register it, mint the opening ticket and
    /// render it for the host's display.
    pub fn open_session(&self, session: SessionId) -> Result<SessionDisplay, EngineError> {
        self.authority.open(session)?;
        self.fanout.write().insert(session, Arc::new(Mutex::new(())));

        // Render before committing so a render failure never leaves a
        // current ticket that was never shown.
        let now = Timestamp::now();
        let ticket = self.authority.prepare(session, self.config.initial_ttl, now)?;
        let display = self.render_display(&ticket)?;
        self.authority.commit(&ticket)?;

        Counters::bump(&self.counters.sessions_opened);
        tracing::info!(session = %session, expires_at = ticket.expires_at.as_micros(), "session opened");
        Ok(display)
    }

    /// Close a session. Presence records survive; tickets stop validating.
    pub fn close_session(&self, session: SessionId) -> Result<(), EngineError> {
        self.authority.close(session)?;
        self.fanout.write().remove(&session);
        tracing::info!(session = %session, "session closed");
        Ok(())
    }

    /// Handle one scan request: validate, record, rotate, fan out.
    pub fn scan(
        &self,
        session: SessionId,
        presented: &str,
        participant: ParticipantId,
    ) -> Result<ScanOutcome, EngineError> {
        Counters::bump(&self.counters.scans);
        let now = Timestamp::now();

        match self.authority.validate(session, presented, now)? {
            Validation::Valid(_) => {}
            Validation::Invalid(reason) => {
                Counters::bump(&self.counters.rejected);
                tracing::debug!(session = %session, participant = %participant, %reason, "scan rejected");
                return Ok(ScanOutcome::Rejected(reason));
            }
        }

        let record = match self.ledger.try_record(session, participant, now) {
            RecordOutcome::AlreadyRecorded(existing) => {
                Counters::bump(&self.counters.duplicates);
                tracing::debug!(session = %session, participant = %participant, "duplicate scan");
                return Ok(ScanOutcome::AlreadyMarked {
                    first_recorded_at: existing.recorded_at,
                });
            }
            RecordOutcome::Recorded(record) => {
                Counters::bump(&self.counters.recorded);
                record
            }
        };

        // The presence fact is durable from here on. A failure below leaves
        // the session with a lagging ticket, which the next successful scan
        // rotates past; nothing is rolled back.
        let display = self.rotate_and_publish(session, record)?;

        Ok(ScanOutcome::Recorded {
            recorded_at: record.recorded_at,
            next: display,
        })
    }

    /// Attach an observer to the session's live event stream
    pub fn observe(&self, session: SessionId) -> Observer {
        self.bus.subscribe(session)
    }

    /// Current display for a session, if a ticket has been minted
    pub fn current_display(&self, session: SessionId) -> Result<Option<SessionDisplay>, EngineError> {
        match self.authority.current(session)? {
            Some(ticket) => Ok(Some(self.render_display(&ticket)?)),
            None => Ok(None),
        }
    }

    /// Presence records for a session, ordered by recording time
    pub fn presence(&self, session: SessionId) -> Vec<PresenceRecord> {
        self.ledger.list_for_session(session)
    }

    /// Committed rotation count for a session
    pub fn rotation_count(&self, session: SessionId) -> Result<u64, EngineError> {
        Ok(self.authority.version(session)?)
    }

    /// Snapshot of engine counters
    pub fn stats(&self) -> EngineStats {
        self.counters.snapshot()
    }

    fn rotate_and_publish(
        &self,
        session: SessionId,
        record: PresenceRecord,
    ) -> Result<SessionDisplay, EngineError> {
        let lock = self
            .fanout
            .read()
            .get(&session)
            .cloned()
            .ok_or(EngineError::SessionNotFound(session))?;
        let _guard = lock.lock();

        // Render before committing: if the QR cannot be produced, the old
        // ticket stays current and the next successful scan rotates past it.
        let next = self
            .authority
            .prepare(session, self.config.rotation_ttl, Timestamp::now())?;
        let display = self.render_display(&next)?;
        self.authority.commit(&next)?;
        Counters::bump(&self.counters.rotations);

        let display_name = self
            .directory
            .display_name(record.participant)
            .unwrap_or_else(|| record.participant.to_string());

        self.bus.publish(
            session,
            SessionEvent::PresenceRecorded {
                participant: record.participant,
                display_name,
                recorded_at: record.recorded_at,
            },
        );
        self.bus.publish(
            session,
            SessionEvent::TicketRotated {
                ticket: display.ticket.clone(),
                expires_at: display.expires_at,
                image: display.image.clone(),
            },
        );

        tracing::debug!(session = %session, participant = %record.participant, "recorded and rotated");
        Ok(display)
    }

    fn render_display(&self, ticket: &Ticket) -> Result<SessionDisplay, EngineError> {
        let encoded = ticket.encode();
        let mark_url = rollcall_visual::mark_url(&self.config.base_url, ticket.session, &encoded);
        let image = rollcall_visual::render(&mark_url)?;
        Ok(SessionDisplay {
            ticket: encoded,
            expires_at: ticket.expires_at,
            mark_url,
            image,
        })
    }
}

impl std::fmt::Debug for RollcallEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollcallEngine")
            .field("config", &self.config)
            .field("authority", &self.authority)
            .finish_non_exhaustive()
    }
}
