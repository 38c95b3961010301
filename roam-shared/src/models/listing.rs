use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Field decoders that never reject a record over one oddly typed scalar.
mod lenient {
    use super::*;

    /// Numbers, or strings holding a number. Anything else reads as absent.
    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// Strings, with numbers and booleans rendered as text.
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }
}

/// Transportation search body as the server sends it.
///
/// Entries stay raw JSON here; null or undecodable entries are dropped when
/// the listing search partitions the response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTransportResponse {
    #[serde(default)]
    pub onward: Vec<Value>,
    #[serde(rename = "return", default)]
    pub return_leg: Option<Vec<Value>>,
}

/// One bookable flight, bus or train departure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportItem {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub provider: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub from_city_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub to_city_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub departure: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub arrival: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub price: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accommodation {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub city_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub rating: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
