//! Session Controller
//!
//! Orchestrates startup rehydration, rate fetches and conversion requests,
//! and coordinates every write to the key-value store.
//! Contains NO infrastructure logic - adapters are injected through ports.

use std::sync::Arc;

use chrono::Utc;
use converter_types::{
    ConversionResult, ConverterError, CurrencyCode, FavoriteId, FavoritePair, HistoryEntry,
    KeyValueStore, Persisted, PersistenceError, Phase, RateProvider, RateSnapshot, Session,
    StateView, keys,
};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::favorites::FavoritesManager;
use crate::history::HistoryManager;
use crate::persisted::read_key;
use crate::state::AppState;

const WARNING_CAPACITY: usize = 32;

/// Currency defaults for a fresh session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Base currency requested from the rate provider.
    pub base_currency: CurrencyCode,
    pub default_from: CurrencyCode,
    pub default_to: CurrencyCode,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            base_currency: CurrencyCode::from_static("USD"),
            default_from: CurrencyCode::from_static("USD"),
            default_to: CurrencyCode::from_static("EUR"),
        }
    }
}

/// What happened to a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// Now reflected in the session and shown to the user.
    Displayed(ConversionResult),
    /// Finished after a more recently issued request; recorded in history
    /// but not shown.
    Superseded(ConversionResult),
}

impl ConversionOutcome {
    pub fn result(&self) -> &ConversionResult {
        match self {
            ConversionOutcome::Displayed(r) | ConversionOutcome::Superseded(r) => r,
        }
    }

    pub fn is_displayed(&self) -> bool {
        matches!(self, ConversionOutcome::Displayed(_))
    }
}

/// Session controller for the converter.
///
/// Generic over the store and rate provider - adapters are injected at
/// compile time. Cloning is cheap and every clone drives the same state.
pub struct SessionController<S, P> {
    inner: Arc<Inner<S, P>>,
}

struct Inner<S, P> {
    settings: ControllerSettings,
    store: Arc<S>,
    provider: P,
    state: AppState,
    favorites: FavoritesManager<S>,
    history: HistoryManager<S>,
    session_write: tokio::sync::Mutex<()>,
    warnings: broadcast::Sender<PersistenceError>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl<S, P> Clone for SessionController<S, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStore, P: RateProvider> SessionController<S, P> {
    /// Creates a controller in the `Uninitialized` phase.
    pub fn new(store: S, provider: P, settings: ControllerSettings) -> Self {
        let store = Arc::new(store);
        let session = Session::new(settings.default_from.clone(), settings.default_to.clone());
        let (warnings, _) = broadcast::channel(WARNING_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                favorites: FavoritesManager::new(Arc::clone(&store)),
                history: HistoryManager::new(Arc::clone(&store)),
                state: AppState::new(session),
                session_write: tokio::sync::Mutex::new(()),
                background: Mutex::new(Vec::new()),
                settings,
                store,
                provider,
                warnings,
            }),
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn provider(&self) -> &P {
        &self.inner.provider
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.inner.settings
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Rehydrates persisted state and starts the first rate fetch.
    ///
    /// Returns once the store reads finish; the fetch keeps running in the
    /// background. Calling it again after startup is a no-op.
    #[instrument(skip(self))]
    pub async fn initialize(&self) {
        if !self.inner.state.transition(Phase::Uninitialized, Phase::Loading) {
            debug!("Already initialized");
            return;
        }

        let fetcher = self.clone();
        self.track(tokio::spawn(async move {
            // Failures are kept in the state for the presentation layer.
            let _ = fetcher.refresh_rates().await;
        }));

        let (_, favorites, history) = tokio::join!(
            self.rehydrate_session(),
            self.inner.favorites.rehydrate(),
            self.inner.history.rehydrate(),
        );

        self.inner.state.transition(Phase::Loading, Phase::Ready);
        info!(favorites, history, "Session ready");
    }

    async fn rehydrate_session(&self) {
        let store = self.inner.store.as_ref();
        let (amount, from, to) = tokio::join!(
            read_key(store, keys::LAST_AMOUNT),
            read_key(store, keys::LAST_FROM_CURRENCY),
            read_key(store, keys::LAST_TO_CURRENCY),
        );

        let from = from.and_then(|raw| parse_stored_code(keys::LAST_FROM_CURRENCY, &raw));
        let to = to.and_then(|raw| parse_stored_code(keys::LAST_TO_CURRENCY, &raw));

        self.inner.state.update_session(|session| {
            if let Some(amount) = amount {
                session.amount = amount;
            }
            if let Some(from) = from {
                session.from_currency = from;
            }
            if let Some(to) = to {
                session.to_currency = to;
            }
        });
    }

    /// Fetches a fresh snapshot and swaps it in.
    ///
    /// On failure the previous snapshot stays in place and the error is
    /// kept for [`get_state`](Self::get_state). No retry is attempted.
    #[instrument(skip(self))]
    pub async fn refresh_rates(&self) -> Result<Arc<RateSnapshot>, ConverterError> {
        let base = &self.inner.settings.base_currency;
        match self.inner.provider.fetch(base).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.inner.state.replace_rates(Arc::clone(&snapshot));
                info!(base = %base, rates = snapshot.len(), "Rates updated");
                Ok(snapshot)
            }
            Err(e) => {
                warn!(base = %base, "Rate fetch failed: {}", e);
                self.inner.state.record_fetch_error(e.clone());
                Err(e.into())
            }
        }
    }

    /// Waits for every background task spawned so far (the startup fetch
    /// and fire-and-forget session writes).
    pub async fn settle(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> = std::mem::take(&mut *self.inner.background.lock());
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    warn!("Background task failed: {}", e);
                }
            }
        }
    }

    /// Receives every non-fatal persistence failure from now on.
    pub fn subscribe_warnings(&self) -> broadcast::Receiver<PersistenceError> {
        self.inner.warnings.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State
    // ─────────────────────────────────────────────────────────────────────────

    pub fn get_state(&self) -> StateView {
        let state = &self.inner.state;
        StateView {
            phase: state.phase(),
            session: state.session(),
            rates: state.rates(),
            last_conversion: state.last_conversion(),
            last_fetch_error: state.last_fetch_error(),
            favorites: self.inner.favorites.list(),
            history: self.inner.history.list(),
        }
    }

    /// Convertible currencies of the current snapshot, sorted.
    pub fn available_currencies(&self) -> Vec<CurrencyCode> {
        self.inner
            .state
            .rates()
            .map(|rates| rates.currencies())
            .unwrap_or_default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Conversion
    // ─────────────────────────────────────────────────────────────────────────

    /// Converts `amount` from one currency to another against the latest
    /// snapshot, records it in history and persists the session in the
    /// background.
    #[instrument(skip(self, from, to), fields(from = %from, to = %to))]
    pub async fn request_conversion(
        &self,
        amount: &str,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<ConversionOutcome, ConverterError> {
        let state = &self.inner.state;
        let sequence = state.next_sequence();
        let _converting = state.begin_conversion();

        let rates = state
            .rates()
            .ok_or_else(|| ConverterError::RateUnavailable(to.clone()))?;
        let converted = exchange_rates::convert_between(amount, &rates, from, to)?;

        let conversion = ConversionResult {
            sequence,
            from: from.clone(),
            to: to.clone(),
            amount: amount.to_string(),
            result: converted.to_string(),
            unit_rate: converted.unit_rate.to_string(),
        };
        let displayed = state.apply_conversion(&conversion);

        let recorded = self
            .inner
            .history
            .record(from.clone(), to.clone(), amount, &conversion.result, Utc::now())
            .await;
        if let Some(warning) = &recorded.warning {
            self.report(warning);
        }

        if displayed {
            self.spawn_session_save();
            Ok(ConversionOutcome::Displayed(conversion))
        } else {
            debug!(sequence, "Conversion superseded by a newer request");
            Ok(ConversionOutcome::Superseded(conversion))
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session edits
    // ─────────────────────────────────────────────────────────────────────────

    /// Exchanges the session's currencies. Not persisted by itself.
    pub fn swap(&self) -> Session {
        self.inner.state.update_session(|session| {
            session.swap();
            session.clone()
        })
    }

    pub fn set_amount(&self, amount: impl Into<String>) {
        let amount = amount.into();
        self.inner
            .state
            .update_session(|session| session.amount = amount);
    }

    pub fn set_from_currency(&self, code: CurrencyCode) {
        self.inner
            .state
            .update_session(|session| session.from_currency = code);
    }

    pub fn set_to_currency(&self, code: CurrencyCode) {
        self.inner
            .state
            .update_session(|session| session.to_currency = code);
    }

    /// Writes the current session fields and waits for the result.
    pub async fn save_session(&self) -> Result<(), PersistenceError> {
        let result = persist_session(&self.inner).await;
        if let Err(e) = &result {
            self.report(e);
        }
        result
    }

    fn spawn_session_save(&self) {
        let inner = Arc::clone(&self.inner);
        self.track(tokio::spawn(async move {
            if let Err(e) = persist_session(&inner).await {
                inner.report(&e);
            }
        }));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Favorites
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn add_favorite(
        &self,
        from: CurrencyCode,
        to: CurrencyCode,
    ) -> Persisted<FavoritePair> {
        let outcome = self.inner.favorites.add(from, to).await;
        if let Some(warning) = &outcome.warning {
            self.report(warning);
        }
        outcome
    }

    /// Removes a favorite; the value is whether one was removed.
    pub async fn remove_favorite(&self, id: &FavoriteId) -> Persisted<bool> {
        let outcome = self.inner.favorites.remove(id).await;
        if let Some(warning) = &outcome.warning {
            self.report(warning);
        }
        outcome
    }

    /// Copies a favorite's pair into the session.
    pub fn select_favorite(&self, id: &FavoriteId) -> Result<FavoritePair, ConverterError> {
        let favorite = self
            .inner
            .favorites
            .select(id)
            .ok_or_else(|| ConverterError::FavoriteNotFound(id.clone()))?;

        self.inner.state.update_session(|session| {
            session.from_currency = favorite.from.clone();
            session.to_currency = favorite.to.clone();
        });
        Ok(favorite)
    }

    pub fn favorites(&self) -> Vec<FavoritePair> {
        self.inner.favorites.list()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────────

    /// Recent conversions, newest first.
    pub fn get_history(&self) -> Vec<HistoryEntry> {
        self.inner.history.list()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Background work
    // ─────────────────────────────────────────────────────────────────────────

    fn track(&self, handle: JoinHandle<()>) {
        let mut background = self.inner.background.lock();
        background.retain(|h| !h.is_finished());
        background.push(handle);
    }

    fn report(&self, err: &PersistenceError) {
        self.inner.report(err);
    }
}

impl<S, P> Inner<S, P> {
    fn report(&self, err: &PersistenceError) {
        warn!(key = %err.key, "Persistence failed: {}", err.message);
        // No subscribers is fine.
        let _ = self.warnings.send(err.clone());
    }
}

/// Writes the session as it is when the write lock is acquired.
async fn persist_session<S: KeyValueStore, P>(inner: &Inner<S, P>) -> Result<(), PersistenceError> {
    let _writing = inner.session_write.lock().await;
    let session = inner.state.session();

    let fields = [
        (keys::LAST_AMOUNT, session.amount.as_str()),
        (keys::LAST_FROM_CURRENCY, session.from_currency.as_str()),
        (keys::LAST_TO_CURRENCY, session.to_currency.as_str()),
    ];
    for (key, value) in fields {
        inner
            .store
            .set(key, value)
            .await
            .map_err(|e| PersistenceError::new(key, e))?;
    }
    debug!("Session saved");
    Ok(())
}

fn parse_stored_code(key: &str, raw: &str) -> Option<CurrencyCode> {
    match raw.parse() {
        Ok(code) => Some(code),
        Err(e) => {
            warn!(key, "Ignoring stored currency: {}", e);
            None
        }
    }
}
