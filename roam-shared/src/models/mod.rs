pub mod city;
pub mod filters;
pub mod listing;
pub mod suggestion;

pub use city::CityBundle;
pub use filters::{FilterSet, TransportMode, TripType};
pub use listing::{Accommodation, RawTransportResponse, TransportItem};
pub use suggestion::Suggestion;
