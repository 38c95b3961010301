pub mod models;
pub mod secret;

pub use models::{
    Accommodation, CityBundle, FilterSet, RawTransportResponse, Suggestion, TransportItem,
    TransportMode, TripType,
};
pub use secret::Secret;
