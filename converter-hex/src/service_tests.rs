//! SessionController unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tokio::sync::Notify;

    use converter_repo::MemoryStore;
    use converter_types::{
        ConverterError, CurrencyCode, FavoriteId, FetchError, HistoryEntry, KeyValueStore, Phase,
        RateProvider, RateSnapshot, StoreError, keys,
    };

    use crate::{ControllerSettings, ConversionOutcome, SessionController};

    // ─────────────────────────────────────────────────────────────────────────
    // Mock store
    // ─────────────────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct StoreInner {
        entries: Mutex<HashMap<String, String>>,
        writes: AtomicUsize,
        fail_writes: AtomicBool,
        gated: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    /// In-memory store with switchable write failures and a write gate.
    ///
    /// Clones share the same entries.
    #[derive(Clone, Default)]
    pub struct MockStore {
        inner: Arc<StoreInner>,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn raw(&self, key: &str) -> Option<String> {
            self.inner.entries.lock().unwrap().get(key).cloned()
        }

        pub fn seed(&self, key: &str, value: &str) {
            self.inner
                .entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }

        /// Successful writes so far.
        pub fn write_count(&self) -> usize {
            self.inner.writes.load(Ordering::SeqCst)
        }

        pub fn fail_writes(&self, fail: bool) {
            self.inner.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Makes the next write park until [`open_gate`](Self::open_gate).
        pub fn close_gate(&self) {
            self.inner.gated.store(true, Ordering::SeqCst);
        }

        pub async fn wait_for_parked_write(&self) {
            self.inner.entered.notified().await;
        }

        pub fn open_gate(&self) {
            self.inner.gated.store(false, Ordering::SeqCst);
            self.inner.release.notify_one();
        }
    }

    #[async_trait]
    impl KeyValueStore for MockStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            Ok(self.raw(key))
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.inner.gated.load(Ordering::SeqCst) {
                self.inner.entered.notify_one();
                self.inner.release.notified().await;
            }
            if self.inner.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("disk full".into()));
            }
            self.seed(key, value);
            self.inner.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.entries.lock().unwrap().remove(key);
            Ok(())
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mock provider
    // ─────────────────────────────────────────────────────────────────────────

    /// Replays scripted fetch results in order, then reports the network down.
    pub struct MockProvider {
        responses: Mutex<VecDeque<Result<RateSnapshot, FetchError>>>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        pub fn new(responses: impl IntoIterator<Item = Result<RateSnapshot, FetchError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn serving(snapshot: RateSnapshot) -> Self {
            Self::new([Ok(snapshot)])
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateProvider for MockProvider {
        async fn fetch(&self, _base: &CurrencyCode) -> Result<RateSnapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::NetworkUnavailable("offline".into())))
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    fn usd_snapshot() -> RateSnapshot {
        RateSnapshot::new(
            code("USD"),
            [
                (code("USD"), dec!(1)),
                (code("EUR"), dec!(0.9123)),
                (code("GBP"), dec!(0.79)),
                (code("INR"), dec!(83.2)),
            ],
            Utc::now(),
        )
        .unwrap()
    }

    async fn ready_controller<S: KeyValueStore>(store: S) -> SessionController<S, MockProvider> {
        let controller = SessionController::new(
            store,
            MockProvider::serving(usd_snapshot()),
            ControllerSettings::default(),
        );
        controller.initialize().await;
        controller.settle().await;
        controller
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_new_controller_is_uninitialized() {
        let controller = SessionController::new(
            MockStore::new(),
            MockProvider::new([]),
            ControllerSettings::default(),
        );

        let state = controller.get_state();
        assert_eq!(state.phase, Phase::Uninitialized);
        assert_eq!(state.session.from_currency, code("USD"));
        assert_eq!(state.session.to_currency, code("EUR"));
        assert!(state.rates.is_none());
    }

    #[tokio::test]
    async fn test_initialize_reaches_ready_with_rates() {
        let controller = ready_controller(MockStore::new()).await;

        let state = controller.get_state();
        assert_eq!(state.phase, Phase::Ready);
        assert_eq!(state.rates.as_ref().unwrap().rate(&code("EUR")), Some(dec!(0.9123)));
        assert!(state.last_fetch_error.is_none());
        assert_eq!(
            controller.available_currencies(),
            vec![code("EUR"), code("GBP"), code("INR"), code("USD")]
        );
    }

    #[tokio::test]
    async fn test_initialize_twice_is_noop() {
        let controller = ready_controller(MockStore::new()).await;

        controller.initialize().await;
        controller.settle().await;

        assert_eq!(controller.provider().calls(), 1);
        assert_eq!(controller.get_state().phase, Phase::Ready);
    }

    #[tokio::test]
    async fn test_failed_first_fetch_leaves_ready_without_rates() {
        let controller = SessionController::new(
            MockStore::new(),
            MockProvider::new([Err(FetchError::NetworkUnavailable("dns".into()))]),
            ControllerSettings::default(),
        );
        controller.initialize().await;
        controller.settle().await;

        let state = controller.get_state();
        assert_eq!(state.phase, Phase::Ready);
        assert!(state.rates.is_none());
        assert_eq!(
            state.last_fetch_error,
            Some(FetchError::NetworkUnavailable("dns".into()))
        );

        let err = controller
            .request_conversion("100", &code("USD"), &code("EUR"))
            .await
            .unwrap_err();
        assert_eq!(err, ConverterError::RateUnavailable(code("EUR")));
        assert!(controller.get_history().is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let controller = SessionController::new(
            MockStore::new(),
            MockProvider::new([
                Ok(usd_snapshot()),
                Err(FetchError::ProviderRejected("quota-reached".into())),
            ]),
            ControllerSettings::default(),
        );
        controller.initialize().await;
        controller.settle().await;

        let err = controller.refresh_rates().await.unwrap_err();
        assert_eq!(err, ConverterError::ProviderRejected("quota-reached".into()));

        let state = controller.get_state();
        let rates = state.rates.as_ref().expect("previous snapshot kept");
        assert_eq!(rates.rate(&code("GBP")), Some(dec!(0.79)));
        assert!(state.last_fetch_error.is_some());

        let outcome = controller
            .request_conversion("100", &code("USD"), &code("EUR"))
            .await
            .unwrap();
        assert_eq!(outcome.result().result, "91.23");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Conversion
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_conversion_updates_session_and_history() {
        let store = MockStore::new();
        let controller = ready_controller(store.clone()).await;

        let outcome = controller
            .request_conversion("100", &code("USD"), &code("EUR"))
            .await
            .unwrap();
        controller.settle().await;

        let ConversionOutcome::Displayed(result) = outcome else {
            panic!("expected a displayed conversion");
        };
        assert_eq!(result.result, "91.23");
        assert_eq!(result.unit_rate, "0.9123");

        let state = controller.get_state();
        assert_eq!(state.last_conversion, Some(result));
        assert_eq!(state.session.amount, "100");

        let history = controller.get_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount, "100");
        assert_eq!(history[0].result, "91.23");

        assert_eq!(store.raw(keys::LAST_AMOUNT).as_deref(), Some("100"));
        assert_eq!(store.raw(keys::LAST_FROM_CURRENCY).as_deref(), Some("USD"));
        assert_eq!(store.raw(keys::LAST_TO_CURRENCY).as_deref(), Some("EUR"));
    }

    #[tokio::test]
    async fn test_conversion_between_non_base_currencies() {
        let controller = ready_controller(MockStore::new()).await;

        let outcome = controller
            .request_conversion("100", &code("EUR"), &code("GBP"))
            .await
            .unwrap();

        assert_eq!(outcome.result().result, "86.59");
    }

    #[tokio::test]
    async fn test_invalid_amount_is_rejected_without_side_effects() {
        let store = MockStore::new();
        let controller = ready_controller(store.clone()).await;

        for amount in ["", "abc"] {
            let err = controller
                .request_conversion(amount, &code("USD"), &code("EUR"))
                .await
                .unwrap_err();
            assert!(matches!(err, ConverterError::InvalidAmount(_)));
        }
        controller.settle().await;

        assert!(controller.get_history().is_empty());
        assert!(controller.get_state().last_conversion.is_none());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_target_currency() {
        let controller = ready_controller(MockStore::new()).await;

        let err = controller
            .request_conversion("5", &code("USD"), &code("XYZ"))
            .await
            .unwrap_err();

        assert_eq!(err, ConverterError::RateUnavailable(code("XYZ")));
    }

    #[tokio::test]
    async fn test_phase_is_converting_while_request_runs() {
        let store = MockStore::new();
        let controller = ready_controller(store.clone()).await;
        store.close_gate();

        let request = {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller
                    .request_conversion("10", &code("USD"), &code("GBP"))
                    .await
            })
        };

        store.wait_for_parked_write().await;
        assert_eq!(controller.get_state().phase, Phase::Converting);

        store.open_gate();
        let outcome = request.await.unwrap().unwrap();
        controller.settle().await;

        assert_eq!(outcome.result().result, "7.90");
        assert_eq!(controller.get_state().phase, Phase::Ready);
    }

    #[tokio::test]
    async fn test_failed_writes_are_reported_not_fatal() {
        let store = MockStore::new();
        let controller = ready_controller(store.clone()).await;
        let mut warnings = controller.subscribe_warnings();
        store.fail_writes(true);

        let outcome = controller
            .request_conversion("100", &code("USD"), &code("INR"))
            .await
            .unwrap();
        controller.settle().await;

        assert!(outcome.is_displayed());
        assert_eq!(outcome.result().result, "8320.00");
        assert_eq!(controller.get_history().len(), 1);

        let first = warnings.recv().await.unwrap();
        assert_eq!(first.key, keys::CONVERSION_HISTORY);
        let second = warnings.recv().await.unwrap();
        assert_eq!(second.key, keys::LAST_AMOUNT);
        assert!(store.raw(keys::CONVERSION_HISTORY).is_none());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session edits and favorites
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_swap_twice_restores_session() {
        let controller = ready_controller(MockStore::new()).await;
        let before = controller.get_state().session;

        let swapped = controller.swap();
        assert_eq!(swapped.from_currency, before.to_currency);
        assert_eq!(swapped.to_currency, before.from_currency);

        assert_eq!(controller.swap(), before);
    }

    #[tokio::test]
    async fn test_select_favorite_sets_session_pair() {
        let controller = ready_controller(MockStore::new()).await;
        let favorite = controller.add_favorite(code("GBP"), code("INR")).await.value;

        let selected = controller.select_favorite(&favorite.id).unwrap();

        assert_eq!(selected, favorite);
        let session = controller.get_state().session;
        assert_eq!(session.from_currency, code("GBP"));
        assert_eq!(session.to_currency, code("INR"));
    }

    #[tokio::test]
    async fn test_select_unknown_favorite() {
        let controller = ready_controller(MockStore::new()).await;
        let before = controller.get_state().session;
        let id = FavoriteId::from("gone");

        let err = controller.select_favorite(&id).unwrap_err();

        assert_eq!(err, ConverterError::FavoriteNotFound(id));
        assert_eq!(controller.get_state().session, before);
    }

    #[tokio::test]
    async fn test_remove_favorite_through_controller() {
        let controller = ready_controller(MockStore::new()).await;
        let keep = controller.add_favorite(code("USD"), code("EUR")).await.value;
        let gone = controller.add_favorite(code("USD"), code("GBP")).await.value;

        assert!(controller.remove_favorite(&gone.id).await.value);
        assert!(!controller.remove_favorite(&gone.id).await.value);
        assert_eq!(controller.favorites(), vec![keep]);
    }

    #[tokio::test]
    async fn test_save_session_reports_failure() {
        let store = MockStore::new();
        let controller = ready_controller(store.clone()).await;
        controller.set_amount("12.5");
        store.fail_writes(true);

        let err = controller.save_session().await.unwrap_err();
        assert_eq!(err.key, keys::LAST_AMOUNT);

        store.fail_writes(false);
        controller.save_session().await.unwrap();
        assert_eq!(store.raw(keys::LAST_AMOUNT).as_deref(), Some("12.5"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rehydration
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_state_survives_restart() {
        let store = MemoryStore::new();
        let first = ready_controller(store.clone()).await;
        first
            .request_conversion("100", &code("USD"), &code("GBP"))
            .await
            .unwrap();
        let favorite = first.add_favorite(code("EUR"), code("INR")).await.value;
        first.settle().await;

        let second = ready_controller(store).await;

        let state = second.get_state();
        assert_eq!(state.session.amount, "100");
        assert_eq!(state.session.from_currency, code("USD"));
        assert_eq!(state.session.to_currency, code("GBP"));
        assert_eq!(state.favorites, vec![favorite]);
        assert_eq!(state.history, first.get_history());
        assert_eq!(state.history[0].result, "79.00");
    }

    #[tokio::test]
    async fn test_corrupt_stored_currency_falls_back_to_default() {
        let store = MockStore::new();
        store.seed(keys::LAST_AMOUNT, "42");
        store.seed(keys::LAST_FROM_CURRENCY, "$$$");
        store.seed(keys::LAST_TO_CURRENCY, "gbp");

        let controller = ready_controller(store).await;

        let session = controller.get_state().session;
        assert_eq!(session.amount, "42");
        assert_eq!(session.from_currency, code("USD"));
        assert_eq!(session.to_currency, code("GBP"));
    }

    #[tokio::test]
    async fn test_history_accepts_legacy_date_field() {
        let store = MockStore::new();
        store.seed(
            keys::CONVERSION_HISTORY,
            r#"[{"id":"1","from":"USD","to":"EUR","amount":"1","result":"0.91","date":"2024-01-01T00:00:00Z"}]"#,
        );

        let controller = ready_controller(store).await;

        let history: Vec<HistoryEntry> = controller.get_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].timestamp, "2024-01-01T00:00:00Z");
    }
}
