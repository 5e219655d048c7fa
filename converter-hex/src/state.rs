//! Application state owned by the session controller.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use converter_types::{ConversionResult, FetchError, Phase, RateSnapshot, Session};
use parking_lot::RwLock;

struct SessionState {
    phase: Phase,
    session: Session,
    last_conversion: Option<ConversionResult>,
    last_fetch_error: Option<FetchError>,
    /// Sequence of the conversion currently reflected in `session`.
    displayed_sequence: u64,
}

/// Session, rates and conversion bookkeeping.
///
/// The rate snapshot sits behind its own lock and is only ever replaced as a
/// whole `Arc`, so readers clone a complete table and never wait on session
/// updates.
pub(crate) struct AppState {
    inner: RwLock<SessionState>,
    rates: RwLock<Option<Arc<RateSnapshot>>>,
    next_sequence: AtomicU64,
    in_flight: AtomicUsize,
}

impl AppState {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            inner: RwLock::new(SessionState {
                phase: Phase::Uninitialized,
                session,
                last_conversion: None,
                last_fetch_error: None,
                displayed_sequence: 0,
            }),
            rates: RwLock::new(None),
            next_sequence: AtomicU64::new(1),
            in_flight: AtomicUsize::new(0),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Reported phase; `Ready` reads as `Converting` while requests run.
    pub(crate) fn phase(&self) -> Phase {
        let phase = self.inner.read().phase;
        if phase == Phase::Ready && self.in_flight.load(Ordering::SeqCst) > 0 {
            Phase::Converting
        } else {
            phase
        }
    }

    /// Moves from `from` to `to`; returns false if the phase was different.
    pub(crate) fn transition(&self, from: Phase, to: Phase) -> bool {
        let mut inner = self.inner.write();
        if inner.phase != from {
            return false;
        }
        inner.phase = to;
        true
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn session(&self) -> Session {
        self.inner.read().session.clone()
    }

    pub(crate) fn update_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut self.inner.write().session)
    }

    pub(crate) fn last_conversion(&self) -> Option<ConversionResult> {
        self.inner.read().last_conversion.clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rates
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn rates(&self) -> Option<Arc<RateSnapshot>> {
        self.rates.read().clone()
    }

    pub(crate) fn replace_rates(&self, snapshot: Arc<RateSnapshot>) {
        *self.rates.write() = Some(snapshot);
        self.inner.write().last_fetch_error = None;
    }

    pub(crate) fn record_fetch_error(&self, err: FetchError) {
        self.inner.write().last_fetch_error = Some(err);
    }

    pub(crate) fn last_fetch_error(&self) -> Option<FetchError> {
        self.inner.read().last_fetch_error.clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Conversions
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn next_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::SeqCst)
    }

    /// Marks a conversion as running until the guard drops.
    pub(crate) fn begin_conversion(&self) -> InFlight<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlight { state: self }
    }

    /// Reflects a finished conversion in the session unless a more recently
    /// issued one is already shown. Returns whether it was applied.
    pub(crate) fn apply_conversion(&self, conversion: &ConversionResult) -> bool {
        let mut inner = self.inner.write();
        if conversion.sequence <= inner.displayed_sequence {
            return false;
        }
        inner.displayed_sequence = conversion.sequence;
        inner.session.amount = conversion.amount.clone();
        inner.session.from_currency = conversion.from.clone();
        inner.session.to_currency = conversion.to.clone();
        inner.last_conversion = Some(conversion.clone());
        true
    }
}

/// Guard counting one in-flight conversion.
pub(crate) struct InFlight<'a> {
    state: &'a AppState,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
