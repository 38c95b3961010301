use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which transportation listing to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Flights,
    Buses,
    Trains,
}

impl TransportMode {
    /// Path segment under `/transportation/`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            TransportMode::Flights => "flights",
            TransportMode::Buses => "buses",
            TransportMode::Trains => "trains",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flights" | "flight" => Ok(TransportMode::Flights),
            "buses" | "bus" => Ok(TransportMode::Buses),
            "trains" | "train" => Ok(TransportMode::Trains),
            other => Err(format!("unknown transport mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripType {
    #[serde(rename = "oneway")]
    OneWay,
    #[serde(rename = "roundtrip")]
    RoundTrip,
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::OneWay => "oneway",
            TripType::RoundTrip => "roundtrip",
        }
    }
}

impl FromStr for TripType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "oneway" => Ok(TripType::OneWay),
            "roundtrip" | "return" => Ok(TripType::RoundTrip),
            other => Err(format!("unknown trip type: {}", other)),
        }
    }
}

/// Named parameters of a listing search.
///
/// Every field is independently settable. No cross-field rules are enforced
/// here: a `to_date` before `from_date` is passed through to the server as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    pub from_city_name: Option<String>,
    pub to_city_name: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub number_of_travelers: Option<u32>,
    pub trip_type: Option<TripType>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_city(mut self, city: impl Into<String>) -> Self {
        self.from_city_name = Some(city.into());
        self
    }

    pub fn to_city(mut self, city: impl Into<String>) -> Self {
        self.to_city_name = Some(city.into());
        self
    }

    pub fn dates(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from_date = from;
        self.to_date = to;
        self
    }

    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn travelers(mut self, count: u32) -> Self {
        self.number_of_travelers = Some(count);
        self
    }

    pub fn trip(mut self, trip_type: TripType) -> Self {
        self.trip_type = Some(trip_type);
        self
    }

    /// Origin city, if present and not blank.
    pub fn origin(&self) -> Option<&str> {
        non_blank(self.from_city_name.as_deref())
    }

    /// Destination city, if present and not blank.
    pub fn destination(&self) -> Option<&str> {
        non_blank(self.to_city_name.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
