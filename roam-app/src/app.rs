use crate::commands::{Command, HELP};
use crate::render;
use roam_core::{
    AccommodationSource, CityOverview, CityStaysSource, ListingSearch, Notifier, SessionContext,
    TransportSource, TravelApi, TypeAhead, TypeAheadConfig,
};
use roam_shared::{FilterSet, TransportMode};
use std::sync::Arc;

/// Which end of the route a picked city fills.
#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Origin,
    Destination,
}

/// Everything one terminal session shows.
pub struct App {
    api: Arc<dyn TravelApi>,
    notifier: Arc<dyn Notifier>,
    session: Arc<SessionContext>,
    type_ahead: TypeAhead,
    transport: ListingSearch<TransportSource>,
    stays: ListingSearch<AccommodationSource>,
    city_stays: ListingSearch<CityStaysSource>,
    overview: CityOverview,
}

/// What the caller should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue(String),
    Quit,
}

impl App {
    pub fn new(
        api: Arc<dyn TravelApi>,
        notifier: Arc<dyn Notifier>,
        session: Arc<SessionContext>,
        type_ahead: TypeAheadConfig,
        mode: TransportMode,
    ) -> Self {
        Self {
            type_ahead: TypeAhead::new(api.clone(), type_ahead),
            transport: ListingSearch::new(TransportSource::new(api.clone(), mode), notifier.clone()),
            stays: ListingSearch::new(AccommodationSource::new(api.clone()), notifier.clone()),
            city_stays: ListingSearch::new(CityStaysSource::new(api.clone()), notifier.clone()),
            overview: CityOverview::new(api.clone(), notifier.clone()),
            api,
            notifier,
            session,
        }
    }

    pub fn type_ahead(&self) -> &TypeAhead {
        &self.type_ahead
    }

    pub fn mode(&self) -> TransportMode {
        self.transport.source().mode()
    }

    /// Seed both listings from a saved search, searching transportation once.
    pub fn initial_search(&self, filters: FilterSet) -> bool {
        self.stays.set_initial_filters(filters.clone());
        self.transport.handle_initial_search(filters)
    }

    fn edit_filters(&self, edit: impl Fn(&mut FilterSet)) {
        self.transport.modify_filters(&edit);
        self.stays.modify_filters(&edit);
    }

    fn use_city(&self, endpoint: Endpoint) -> String {
        let Some(city) = self.type_ahead.search_term() else {
            return "  pick a suggestion first".to_string();
        };
        self.edit_filters(|f| match endpoint {
            Endpoint::Origin => f.from_city_name = Some(city.clone()),
            Endpoint::Destination => f.to_city_name = Some(city.clone()),
        });
        self.type_ahead.clear();
        render::filters(self.transport.state().filters.as_ref())
    }

    pub async fn handle(&mut self, command: Command) -> Outcome {
        let message = match command {
            Command::Query(text) => {
                self.type_ahead.set_query(text);
                String::new()
            }
            Command::Pick(index) => match self.type_ahead.select(index) {
                Some(picked) => format!("  selected {}", picked.display_name()),
                None => "  no such suggestion".to_string(),
            },
            Command::From => self.use_city(Endpoint::Origin),
            Command::To => self.use_city(Endpoint::Destination),
            Command::Dates(from, to) => {
                self.edit_filters(|f| {
                    f.from_date = Some(from);
                    f.to_date = to;
                });
                render::filters(self.transport.state().filters.as_ref())
            }
            Command::Travelers(count) => {
                self.edit_filters(|f| f.number_of_travelers = Some(count));
                render::filters(self.transport.state().filters.as_ref())
            }
            Command::Trip(trip) => {
                self.edit_filters(|f| f.trip_type = Some(trip));
                render::filters(self.transport.state().filters.as_ref())
            }
            Command::Price(min, max) => {
                self.edit_filters(|f| {
                    f.min_price = min;
                    f.max_price = max;
                });
                render::filters(self.transport.state().filters.as_ref())
            }
            Command::Mode(mode) => {
                let filters = self.transport.state().filters;
                let next = ListingSearch::new(
                    TransportSource::new(self.api.clone(), mode),
                    self.notifier.clone(),
                );
                if let Some(filters) = filters {
                    next.set_initial_filters(filters);
                }
                // The replaced listing tears itself down on drop.
                self.transport = next;
                format!("  searching {}", mode)
            }
            Command::Search => {
                self.transport.handle_search();
                let state = self.transport.settled().await;
                if state.filters.as_ref().map_or(true, |f| f.origin().is_none() || f.destination().is_none()) {
                    "  set both :from and :to first".to_string()
                } else {
                    render::transport(&state)
                }
            }
            Command::Stay => {
                self.stays.handle_search();
                let state = self.stays.settled().await;
                if state.filters.as_ref().and_then(|f| f.destination()).is_none() {
                    "  set :to first".to_string()
                } else {
                    render::stays(&state)
                }
            }
            Command::StaysIn(city) => {
                self.city_stays.update_filters(FilterSet::new().to_city(city));
                self.city_stays.handle_search();
                render::stays(&self.city_stays.settled().await)
            }
            Command::City(name) => {
                let user_city = self
                    .transport
                    .state()
                    .filters
                    .and_then(|f| f.origin().map(str::to_string));
                self.overview.load(&name, user_city.as_deref());
                render::overview(&self.overview.settled().await)
            }
            Command::Login(token) => match self.session.save_token(token) {
                Ok(()) => "  logged in".to_string(),
                Err(e) => format!("  ! {}", e),
            },
            Command::Logout => match self.session.clear() {
                Ok(()) => "  logged out".to_string(),
                Err(e) => format!("  ! {}", e),
            },
            Command::Show => format!(
                "  mode {} | {}\n{}",
                self.mode(),
                if self.session.is_authenticated() { "logged in" } else { "guest" },
                render::filters(self.transport.state().filters.as_ref()),
            ),
            Command::Help => HELP.to_string(),
            Command::Quit => {
                self.teardown();
                return Outcome::Quit;
            }
        };
        Outcome::Continue(message)
    }

    pub fn teardown(&self) {
        self.type_ahead.teardown();
        self.transport.teardown();
        self.stays.teardown();
        self.city_stays.teardown();
        self.overview.teardown();
    }
}
