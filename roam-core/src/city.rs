use crate::api::TravelApi;
use crate::notify::{Notification, Notifier};
use crate::sequence::{apply_if_current, RequestSequence, Sequenced};
use parking_lot::Mutex;
use roam_shared::CityBundle;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Default)]
pub struct CityOverviewState {
    pub searched_city: Option<String>,
    pub bundle: Option<CityBundle>,
    pub loading: bool,
    pub error: Option<String>,
    seq: RequestSequence,
}

impl Sequenced for CityOverviewState {
    fn sequence(&mut self) -> &mut RequestSequence {
        &mut self.seq
    }
}

/// Loads the destination page bundle (city, experiences, stays, transport).
pub struct CityOverview {
    api: Arc<dyn TravelApi>,
    notifier: Arc<dyn Notifier>,
    state: Arc<watch::Sender<CityOverviewState>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CityOverview {
    pub fn new(api: Arc<dyn TravelApi>, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(CityOverviewState::default());
        Self { api, notifier, state: Arc::new(state), task: Mutex::new(None) }
    }

    pub fn state(&self) -> CityOverviewState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CityOverviewState> {
        self.state.subscribe()
    }

    /// Load the bundle for `searched_city`. A later load supersedes this one.
    pub fn load(&self, searched_city: &str, user_city: Option<&str>) {
        let searched = searched_city.trim().to_string();
        let mut token = None;
        self.state.send_modify(|s| {
            if searched.is_empty() {
                // Blank input supersedes, but never fetches.
                s.seq.invalidate();
                s.loading = false;
                return;
            }
            token = s.seq.issue();
            if token.is_some() {
                s.searched_city = Some(searched.clone());
                s.loading = true;
            }
        });
        let Some(token) = token else {
            debug!("city overview skipped");
            return;
        };

        let api = self.api.clone();
        let notifier = self.notifier.clone();
        let state = self.state.clone();
        let user_city = user_city.map(str::to_string);
        let handle = tokio::spawn(async move {
            debug!(city = %searched, token, "loading city overview");
            let result = api.search_city(&searched, user_city.as_deref()).await;
            let mut failure = None;
            let applied = apply_if_current(&state, token, |s| {
                match result {
                    Ok(bundle) => {
                        s.bundle = Some(bundle);
                        s.error = None;
                    }
                    Err(e) if e.is_malformed() => {
                        warn!(city = %searched, "malformed city overview: {}", e);
                        s.bundle = Some(CityBundle::default());
                        s.error = None;
                    }
                    Err(e) => {
                        error!(city = %searched, "city overview failed: {}", e);
                        s.bundle = None;
                        s.error = Some(e.user_message());
                        failure = s.error.clone();
                    }
                }
                s.loading = false;
            });
            if !applied {
                debug!(city = %searched, token, "discarding stale city overview");
            } else if let Some(message) = failure {
                notifier.notify(Notification::error(message));
            }
        });

        if let Some(previous) = self.task.lock().replace(handle) {
            // Superseded; its response would be discarded anyway.
            previous.abort();
        }
    }

    pub async fn settled(&self) -> CityOverviewState {
        let mut rx = self.state.subscribe();
        let settled = match rx.wait_for(|s| !s.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    pub fn teardown(&self) {
        self.state.send_modify(|s| {
            s.seq.close();
            s.loading = false;
        });
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

impl Drop for CityOverview {
    fn drop(&mut self) {
        self.teardown();
    }
}
