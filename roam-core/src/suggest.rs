use crate::api::TravelApi;
use crate::debounce::DebounceGate;
use crate::selection::{SearchPolicy, Selection};
use crate::sequence::{apply_if_current, RequestSequence, Sequenced};
use roam_shared::Suggestion;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestPhase {
    /// Query below the minimum length; nothing requested.
    Idle,
    /// A qualifying edit is waiting out the debounce window.
    Debouncing,
    /// The debounced request is in flight.
    Fetching,
    /// The latest request finished with suggestions or an error.
    Settled,
}

#[derive(Debug, Clone)]
pub struct TypeAheadConfig {
    pub debounce: Duration,
    pub min_query_len: usize,
    pub policy: SearchPolicy,
}

impl Default for TypeAheadConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            min_query_len: 3,
            policy: SearchPolicy::SelectedOnly,
        }
    }
}

/// Snapshot of one type-ahead input.
#[derive(Debug, Clone)]
pub struct TypeAheadState {
    pub selection: Selection,
    pub phase: SuggestPhase,
    /// In server response order.
    pub suggestions: Vec<Suggestion>,
    pub error: Option<String>,
    pub search_enabled: bool,
    seq: RequestSequence,
}

impl TypeAheadState {
    fn new() -> Self {
        Self {
            selection: Selection::default(),
            phase: SuggestPhase::Idle,
            suggestions: Vec::new(),
            error: None,
            search_enabled: false,
            seq: RequestSequence::default(),
        }
    }

    pub fn query(&self) -> &str {
        self.selection.query()
    }

    pub fn selected(&self) -> Option<&Suggestion> {
        self.selection.selected()
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, SuggestPhase::Debouncing | SuggestPhase::Fetching)
    }
}

impl Sequenced for TypeAheadState {
    fn sequence(&mut self) -> &mut RequestSequence {
        &mut self.seq
    }
}

struct Shared {
    api: Arc<dyn TravelApi>,
    state: watch::Sender<TypeAheadState>,
    config: TypeAheadConfig,
}

/// Debounced city autocomplete with selection tracking.
///
/// Edits below `min_query_len` clear the list immediately and never reach the
/// network. Longer edits re-arm the debounce gate; only the call that survives
/// the quiet period is sent, and only the response to the most recently
/// issued request is applied.
pub struct TypeAhead {
    shared: Arc<Shared>,
    gate: DebounceGate<String>,
}

impl TypeAhead {
    pub fn new(api: Arc<dyn TravelApi>, config: TypeAheadConfig) -> Self {
        let (state, _) = watch::channel(TypeAheadState::new());
        let shared = Arc::new(Shared { api, state, config });

        let fetch_shared = shared.clone();
        let gate = DebounceGate::new(shared.config.debounce, move |query: String| {
            fetch_suggestions(fetch_shared.clone(), query)
        });

        Self { shared, gate }
    }

    pub fn policy(&self) -> SearchPolicy {
        self.shared.config.policy
    }

    pub fn state(&self) -> TypeAheadState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TypeAheadState> {
        self.shared.state.subscribe()
    }

    /// Apply a user edit to the query.
    ///
    /// Safe to call from several threads: the gate is re-armed while the
    /// state lock is held, so the pending call always carries the text that
    /// ended up in the query.
    pub fn set_query(&self, text: impl Into<String>) {
        let text = text.into();
        let min_len = self.shared.config.min_query_len;
        let policy = self.shared.config.policy;

        self.shared.state.send_modify(|s| {
            if s.seq.is_closed() {
                return;
            }
            if s.selection.edit(text.clone()) {
                debug!("selection invalidated by edit");
            }
            // Any edit supersedes whatever request is in flight.
            s.seq.invalidate();

            if text.chars().count() < min_len {
                s.suggestions.clear();
                s.error = None;
                s.phase = SuggestPhase::Idle;
                self.gate.cancel();
            } else if s.selection.selected().is_some() {
                s.phase = SuggestPhase::Idle;
                self.gate.cancel();
            } else {
                s.phase = SuggestPhase::Debouncing;
                self.gate.call(text.clone());
            }
            s.search_enabled = s.selection.can_search(policy);
        });
    }

    /// Pick the suggestion at `index` from the current list.
    pub fn select(&self, index: usize) -> Option<Suggestion> {
        let candidate = self.shared.state.borrow().suggestions.get(index).cloned()?;
        self.select_suggestion(candidate.clone());
        Some(candidate)
    }

    /// Copy the candidate into the query and close the suggestion list.
    pub fn select_suggestion(&self, candidate: Suggestion) {
        let policy = self.shared.config.policy;
        self.gate.cancel();
        self.shared.state.send_modify(|s| {
            if s.seq.is_closed() {
                return;
            }
            s.seq.invalidate();
            s.selection.select(candidate);
            s.suggestions.clear();
            s.error = None;
            s.phase = SuggestPhase::Idle;
            s.search_enabled = s.selection.can_search(policy);
        });
    }

    pub fn clear(&self) {
        self.gate.cancel();
        self.shared.state.send_modify(|s| {
            if s.seq.is_closed() {
                return;
            }
            s.seq.invalidate();
            s.selection.clear();
            s.suggestions.clear();
            s.error = None;
            s.phase = SuggestPhase::Idle;
            s.search_enabled = false;
        });
    }

    /// Text a search should use, honoring the configured policy.
    pub fn search_term(&self) -> Option<String> {
        self.shared
            .state
            .borrow()
            .selection
            .search_term(self.shared.config.policy)
            .map(str::to_string)
    }

    /// Wait until no debounce window or request is outstanding.
    pub async fn settled(&self) -> TypeAheadState {
        let mut rx = self.shared.state.subscribe();
        let settled = match rx.wait_for(|s| !s.is_busy() || s.seq.is_closed()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    /// Stop all activity; later responses and edits are ignored.
    pub fn teardown(&self) {
        self.gate.teardown();
        self.shared.state.send_modify(|s| {
            s.seq.close();
            if s.is_busy() {
                s.phase = SuggestPhase::Idle;
            }
        });
    }
}

impl Drop for TypeAhead {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn fetch_suggestions(shared: Arc<Shared>, query: String) {
    let mut token = None;
    shared.state.send_if_modified(|s| {
        // The gate only fires for the latest edit, but an edit that landed
        // while the timer was firing still wins.
        if s.query() != query {
            return false;
        }
        token = s.seq.issue();
        if token.is_some() {
            s.phase = SuggestPhase::Fetching;
        }
        token.is_some()
    });
    let Some(token) = token else {
        return;
    };

    debug!(query = %query, token, "fetching city suggestions");
    let result = shared.api.suggest_cities(&query).await;

    let applied = apply_if_current(&shared.state, token, |s| {
        match &result {
            Ok(list) => {
                s.suggestions = list.clone();
                s.error = None;
            }
            Err(e) if e.is_malformed() => {
                warn!(query = %query, "malformed suggestion response: {}", e);
                s.suggestions.clear();
                s.error = Some(e.user_message());
            }
            Err(e) => {
                error!(query = %query, "suggestion request failed: {}", e);
                s.suggestions.clear();
                s.error = Some(e.user_message());
            }
        }
        s.phase = SuggestPhase::Settled;
    });

    if !applied {
        debug!(query = %query, token, "discarding stale suggestion response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::testing::{network_error, FakeApi};

    fn type_ahead(api: &Arc<FakeApi>, policy: SearchPolicy) -> TypeAhead {
        TypeAhead::new(api.clone(), TypeAheadConfig { policy, ..TypeAheadConfig::default() })
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        tokio::task::yield_now().await;
    }

    fn paris_results() -> Vec<Suggestion> {
        vec![Suggestion::new("Paris"), Suggestion::new("Paris, Texas")]
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_queries_never_reach_network() {
        let api = FakeApi::new();
        let input = type_ahead(&api, SearchPolicy::SelectedOnly);

        for query in ["", "P", "Pa", "日本"] {
            input.set_query(query);
            advance(500).await;
            let state = input.state();
            assert_eq!(state.phase, SuggestPhase::Idle);
            assert!(state.suggestions.is_empty());
        }
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_issues_one_call_for_final_query() {
        let api = FakeApi::new();
        api.on_suggest("Paris", Ok(paris_results()));
        let input = type_ahead(&api, SearchPolicy::SelectedOnly);

        input.set_query("Par");
        advance(100).await;
        input.set_query("Pari");
        advance(100).await;
        input.set_query("Paris");
        assert_eq!(input.state().phase, SuggestPhase::Debouncing);
        assert!(api.calls().is_empty());

        let state = input.settled().await;
        assert_eq!(api.calls(), vec!["suggest:Paris".to_string()]);
        assert_eq!(state.phase, SuggestPhase::Settled);
        assert_eq!(state.suggestions, paris_results());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shrinking_below_threshold_clears_immediately() {
        let api = FakeApi::new();
        api.on_suggest("Berl", Ok(vec![Suggestion::new("Berlin")]));
        let input = type_ahead(&api, SearchPolicy::SelectedOnly);

        input.set_query("Berl");
        input.settled().await;
        assert_eq!(input.state().suggestions.len(), 1);

        input.set_query("Be");
        let state = input.state();
        assert_eq!(state.phase, SuggestPhase::Idle);
        assert!(state.suggestions.is_empty());
        advance(500).await;
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let api = FakeApi::new();
        let slow = api.on_suggest_held("Lond", Ok(vec![Suggestion::new("Londrina")]));
        api.on_suggest("London", Ok(vec![Suggestion::new("London")]));
        let input = type_ahead(&api, SearchPolicy::SelectedOnly);

        input.set_query("Lond");
        advance(350).await;
        assert_eq!(input.state().phase, SuggestPhase::Fetching);

        input.set_query("London");
        let state = input.settled().await;
        assert_eq!(state.suggestions, vec![Suggestion::new("London")]);

        slow.notify_one();
        advance(10).await;
        assert_eq!(input.state().suggestions, vec![Suggestion::new("London")]);
        assert_eq!(api.calls(), vec!["suggest:Lond".to_string(), "suggest:London".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_response_ignored_after_short_edit() {
        let api = FakeApi::new();
        let slow = api.on_suggest_held("Madr", Ok(vec![Suggestion::new("Madrid")]));
        let input = type_ahead(&api, SearchPolicy::SelectedOnly);

        input.set_query("Madr");
        advance(350).await;
        input.set_query("Ma");
        slow.notify_one();
        advance(10).await;

        let state = input.state();
        assert_eq!(state.phase, SuggestPhase::Idle);
        assert!(state.suggestions.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_closes_list_and_edit_invalidates() {
        let api = FakeApi::new();
        api.on_suggest("Paris", Ok(paris_results()));
        let input = type_ahead(&api, SearchPolicy::SelectedOnly);

        input.set_query("Paris");
        input.settled().await;
        assert!(!input.state().search_enabled);

        let picked = input.select(1);
        assert_eq!(picked, Some(Suggestion::new("Paris, Texas")));
        let state = input.state();
        assert_eq!(state.query(), "Paris, Texas");
        assert!(state.suggestions.is_empty());
        assert!(state.search_enabled);
        assert_eq!(input.search_term().as_deref(), Some("Paris, Texas"));

        input.set_query("Paris, Texa");
        let state = input.state();
        assert!(state.selected().is_none());
        assert!(!state.search_enabled);
        assert_eq!(state.phase, SuggestPhase::Debouncing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_free_text_policy_enables_search_without_selection() {
        let api = FakeApi::new();
        let input = type_ahead(&api, SearchPolicy::FreeText);

        input.set_query("   ");
        assert!(!input.state().search_enabled);
        input.set_query(" Nice ");
        assert!(input.state().search_enabled);
        assert_eq!(input.search_term().as_deref(), Some("Nice"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_failure_settles_with_error() {
        let api = FakeApi::new();
        api.on_suggest("Vienna", Err(network_error()));
        let input = type_ahead(&api, SearchPolicy::SelectedOnly);

        input.set_query("Vienna");
        let state = input.settled().await;
        assert_eq!(state.phase, SuggestPhase::Settled);
        assert!(state.suggestions.is_empty());
        assert!(state.error.is_some());

        // No automatic retry.
        advance(2_000).await;
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparseable_response_settles_with_error() {
        let api = FakeApi::new();
        api.on_suggest("Porto", Ok(vec![Suggestion::new("Porto")]));
        let input = type_ahead(&api, SearchPolicy::SelectedOnly);

        input.set_query("Porto");
        assert_eq!(input.settled().await.suggestions.len(), 1);

        api.on_suggest("Portof", Err(ApiError::Malformed("expected array".into())));
        input.set_query("Portof");
        let state = input.settled().await;
        assert_eq!(state.phase, SuggestPhase::Settled);
        assert!(state.suggestions.is_empty());
        assert!(state.error.is_some());

        advance(2_000).await;
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_edits_fetch_the_surviving_query() {
        let api = FakeApi::new();
        let input = type_ahead(&api, SearchPolicy::SelectedOnly);
        let runtime = tokio::runtime::Handle::current();

        std::thread::scope(|scope| {
            for city in ["Lisbon", "Lyon", "Leeds", "Lagos", "Lima", "Luxor"] {
                let input = &input;
                let runtime = runtime.clone();
                scope.spawn(move || {
                    let _guard = runtime.enter();
                    for _ in 0..20 {
                        input.set_query(city);
                    }
                });
            }
        });

        let state = input.settled().await;
        assert_eq!(state.phase, SuggestPhase::Settled);
        assert_eq!(api.calls(), vec![format!("suggest:{}", state.query())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_stops_pending_and_in_flight_work() {
        let api = FakeApi::new();
        let slow = api.on_suggest_held("Dubai", Ok(vec![Suggestion::new("Dubai")]));
        let input = type_ahead(&api, SearchPolicy::SelectedOnly);

        input.set_query("Oslo");
        input.teardown();
        advance(500).await;
        assert!(api.calls().is_empty());

        let input = type_ahead(&api, SearchPolicy::SelectedOnly);
        let mut rx = input.subscribe();
        input.set_query("Dubai");
        advance(350).await;
        input.teardown();
        slow.notify_one();
        advance(10).await;
        assert!(rx.borrow_and_update().suggestions.is_empty());
    }
}
