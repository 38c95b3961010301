pub mod api;
pub mod city;
pub mod debounce;
pub mod listing;
pub mod notify;
pub mod selection;
pub mod sequence;
pub mod session;
pub mod suggest;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiError, ApiResult, TravelApi};
pub use city::{CityOverview, CityOverviewState};
pub use debounce::DebounceGate;
pub use listing::{
    AccommodationSource, CityStaysSource, Legs, ListingPhase, ListingSearch, ListingSource,
    SearchState, TransportSource,
};
pub use notify::{ChannelNotifier, Notification, NotificationLevel, Notifier, TracingNotifier};
pub use selection::{SearchPolicy, Selection};
pub use session::{MemorySessionStore, SessionContext, SessionData, SessionStore};
pub use suggest::{SuggestPhase, TypeAhead, TypeAheadConfig, TypeAheadState};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Session store error: {0}")]
    SessionError(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

pub type CoreResult<T> = Result<T, CoreError>;
