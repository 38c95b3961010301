use crate::api::{ApiResult, TravelApi};
use crate::notify::{Notification, Notifier};
use crate::sequence::{apply_if_current, RequestSequence, Sequenced};
use crate::{CoreError, CoreResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use roam_shared::{Accommodation, FilterSet, TransportItem, TransportMode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingPhase {
    /// No filters yet.
    Unprimed,
    /// Filters set, nothing in flight.
    Ready,
    /// A fetch cycle is running.
    Searching,
}

/// Partitioned results. Single-sequence listings only use `onward`.
#[derive(Debug, Clone, PartialEq)]
pub struct Legs<T> {
    pub onward: Vec<T>,
    pub return_leg: Option<Vec<T>>,
}

impl<T> Default for Legs<T> {
    fn default() -> Self {
        Self { onward: Vec::new(), return_leg: None }
    }
}

impl<T> Legs<T> {
    pub fn is_empty(&self) -> bool {
        self.onward.is_empty() && self.return_leg.as_ref().map_or(true, Vec::is_empty)
    }

    pub fn len(&self) -> usize {
        self.onward.len() + self.return_leg.as_ref().map_or(0, Vec::len)
    }
}

/// Snapshot of one listing page.
#[derive(Debug, Clone)]
pub struct SearchState<T> {
    pub filters: Option<FilterSet>,
    pub results: Legs<T>,
    pub loading: bool,
    pub error: Option<String>,
    /// Set by an explicit search request, cleared when its cycle ends.
    pub should_search: bool,
    pub phase: ListingPhase,
    seq: RequestSequence,
}

impl<T> SearchState<T> {
    fn new() -> Self {
        Self {
            filters: None,
            results: Legs::default(),
            loading: false,
            error: None,
            should_search: false,
            phase: ListingPhase::Unprimed,
            seq: RequestSequence::default(),
        }
    }

    fn rest_phase(&self) -> ListingPhase {
        if self.filters.is_some() {
            ListingPhase::Ready
        } else {
            ListingPhase::Unprimed
        }
    }
}

impl<T> Sequenced for SearchState<T> {
    fn sequence(&mut self) -> &mut RequestSequence {
        &mut self.seq
    }
}

/// One kind of listing the search page can show.
#[async_trait]
pub trait ListingSource: Send + Sync + 'static {
    type Item: Clone + fmt::Debug + Send + Sync + 'static;

    fn name(&self) -> &str;

    /// Required-field check. A failure skips the cycle silently.
    fn validate(&self, filters: &FilterSet) -> CoreResult<()>;

    async fn fetch(&self, filters: &FilterSet) -> ApiResult<Legs<Self::Item>>;
}

/// Flights, buses or trains between two cities.
pub struct TransportSource {
    api: Arc<dyn TravelApi>,
    mode: TransportMode,
}

impl TransportSource {
    pub fn new(api: Arc<dyn TravelApi>, mode: TransportMode) -> Self {
        Self { api, mode }
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }
}

#[async_trait]
impl ListingSource for TransportSource {
    type Item = TransportItem;

    fn name(&self) -> &str {
        self.mode.path_segment()
    }

    fn validate(&self, filters: &FilterSet) -> CoreResult<()> {
        if filters.origin().is_none() {
            return Err(CoreError::ValidationError("fromCityName is required".to_string()));
        }
        if filters.destination().is_none() {
            return Err(CoreError::ValidationError("toCityName is required".to_string()));
        }
        Ok(())
    }

    async fn fetch(&self, filters: &FilterSet) -> ApiResult<Legs<TransportItem>> {
        let raw = self.api.search_transportation(self.mode, filters).await?;
        Ok(Legs {
            onward: decode_entries(raw.onward),
            return_leg: raw.return_leg.map(decode_entries),
        })
    }
}

/// Stays at the destination of a trip.
pub struct AccommodationSource {
    api: Arc<dyn TravelApi>,
}

impl AccommodationSource {
    pub fn new(api: Arc<dyn TravelApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ListingSource for AccommodationSource {
    type Item = Accommodation;

    fn name(&self) -> &str {
        "accommodation"
    }

    fn validate(&self, filters: &FilterSet) -> CoreResult<()> {
        if filters.destination().is_none() {
            return Err(CoreError::ValidationError("ToCity is required".to_string()));
        }
        Ok(())
    }

    async fn fetch(&self, filters: &FilterSet) -> ApiResult<Legs<Accommodation>> {
        let raw = self.api.search_accommodations(filters).await?;
        Ok(Legs { onward: decode_entries(raw), return_leg: None })
    }
}

/// Every stay listed for one city, outside of any trip search.
///
/// Only the destination of the filter set is used.
pub struct CityStaysSource {
    api: Arc<dyn TravelApi>,
}

impl CityStaysSource {
    pub fn new(api: Arc<dyn TravelApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ListingSource for CityStaysSource {
    type Item = Accommodation;

    fn name(&self) -> &str {
        "city-stays"
    }

    fn validate(&self, filters: &FilterSet) -> CoreResult<()> {
        if filters.destination().is_none() {
            return Err(CoreError::ValidationError("cityName is required".to_string()));
        }
        Ok(())
    }

    async fn fetch(&self, filters: &FilterSet) -> ApiResult<Legs<Accommodation>> {
        let city = filters.destination().unwrap_or_default();
        let raw = self.api.accommodations_in_city(city).await?;
        Ok(Legs { onward: decode_entries(raw), return_leg: None })
    }
}

/// Decode raw entries, dropping nulls and entries of a foreign shape.
pub fn decode_entries<T: DeserializeOwned>(raw: Vec<Value>) -> Vec<T> {
    raw.into_iter()
        .filter(|entry| !entry.is_null())
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!("dropping undecodable listing entry: {}", e);
                None
            }
        })
        .collect()
}

struct Shared<S: ListingSource> {
    source: S,
    state: watch::Sender<SearchState<S::Item>>,
    notifier: Arc<dyn Notifier>,
}

/// Filter set, results and the explicit search latch for one listing page.
///
/// Editing filters never fetches. `handle_search` sets the latch and runs
/// exactly one fetch cycle for the filters current at that moment; a newer
/// search supersedes an older one, whose response is then dropped.
pub struct ListingSearch<S: ListingSource> {
    shared: Arc<Shared<S>>,
    initial_done: AtomicBool,
    cycles: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: ListingSource> ListingSearch<S> {
    pub fn new(source: S, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(SearchState::new());
        Self {
            shared: Arc::new(Shared { source, state, notifier }),
            initial_done: AtomicBool::new(false),
            cycles: Mutex::new(Vec::new()),
        }
    }

    pub fn source(&self) -> &S {
        &self.shared.source
    }

    pub fn state(&self) -> SearchState<S::Item> {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState<S::Item>> {
        self.shared.state.subscribe()
    }

    /// Seed filters from a previous page's handoff, without fetching.
    pub fn set_initial_filters(&self, filters: FilterSet) {
        self.store_filters(filters);
    }

    /// Apply a user edit to the filter controls, without fetching.
    pub fn update_filters(&self, filters: FilterSet) {
        self.store_filters(filters);
    }

    /// Edit the current filters in place, without fetching.
    pub fn modify_filters(&self, edit: impl FnOnce(&mut FilterSet)) {
        let mut filters = self.shared.state.borrow().filters.clone().unwrap_or_default();
        edit(&mut filters);
        self.store_filters(filters);
    }

    fn store_filters(&self, filters: FilterSet) {
        self.shared.state.send_modify(|s| {
            if s.seq.is_closed() {
                return;
            }
            s.filters = Some(filters);
            if s.phase == ListingPhase::Unprimed {
                s.phase = ListingPhase::Ready;
            }
        });
    }

    /// Explicit search request for the current filters.
    pub fn handle_search(&self) {
        let source = &self.shared.source;
        let mut cycle = None;

        self.shared.state.send_modify(|s| {
            let Some(token) = s.seq.issue() else {
                return;
            };
            s.should_search = true;

            let filters = match s.filters.clone() {
                Some(filters) => filters,
                None => {
                    debug!(listing = source.name(), "search skipped: no filters");
                    s.should_search = false;
                    s.loading = false;
                    return;
                }
            };
            if let Err(e) = source.validate(&filters) {
                debug!(listing = source.name(), "search skipped: {}", e);
                s.should_search = false;
                s.loading = false;
                s.phase = s.rest_phase();
                return;
            }

            s.loading = true;
            s.phase = ListingPhase::Searching;
            cycle = Some((token, filters));
        });

        if let Some((token, filters)) = cycle {
            let shared = self.shared.clone();
            let handle = tokio::spawn(run_cycle(shared, token, filters));
            let mut cycles = self.cycles.lock();
            cycles.retain(|h| !h.is_finished());
            cycles.push(handle);
        }
    }

    /// One-shot search for a page's first render. Returns false if an
    /// initial search already happened during this instance's lifetime.
    pub fn handle_initial_search(&self, filters: FilterSet) -> bool {
        if self.initial_done.swap(true, Ordering::SeqCst) {
            debug!(listing = self.shared.source.name(), "initial search already performed");
            return false;
        }
        self.set_initial_filters(filters);
        self.handle_search();
        true
    }

    /// Wait until the latch is clear.
    pub async fn settled(&self) -> SearchState<S::Item> {
        let mut rx = self.shared.state.subscribe();
        let settled = match rx.wait_for(|s| !s.should_search).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    /// Stop all activity; in-flight responses are ignored from here on.
    pub fn teardown(&self) {
        self.shared.state.send_modify(|s| {
            s.seq.close();
            s.should_search = false;
            s.loading = false;
        });
        for handle in self.cycles.lock().drain(..) {
            handle.abort();
        }
    }
}

impl<S: ListingSource> Drop for ListingSearch<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn run_cycle<S: ListingSource>(shared: Arc<Shared<S>>, token: u64, filters: FilterSet) {
    let name = shared.source.name().to_string();
    debug!(listing = %name, token, "fetching listing");
    let result = shared.source.fetch(&filters).await;

    let mut failure = None;
    let applied = apply_if_current(&shared.state, token, |s| {
        match result {
            Ok(legs) => {
                debug!(listing = %name, items = legs.len(), "listing fetched");
                s.results = legs;
                s.error = None;
            }
            Err(e) if e.is_malformed() => {
                warn!(listing = %name, "malformed listing response: {}", e);
                s.results = Legs::default();
                s.error = None;
            }
            Err(e) => {
                error!(listing = %name, "listing request failed: {}", e);
                let message = e.user_message();
                s.results = Legs::default();
                s.error = Some(message.clone());
                failure = Some(message);
            }
        }
        s.loading = false;
        s.should_search = false;
        s.phase = ListingPhase::Ready;
    });

    if !applied {
        debug!(listing = %name, token, "discarding stale listing response");
        return;
    }
    if let Some(message) = failure {
        shared.notifier.notify(Notification::error(message));
    }
}
