pub mod fields;
pub mod reach;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::candidate::fields::{number_from_paths, object_path_value, string_from_paths, to_text};
use crate::candidate::reach::ReachEstimate;

const ID_PATHS: &[&str] = &["id", "channel_id"];
const PRICE_PATHS: &[&str] = &["price"];
const REACH_PATHS: &[&str] = &["reach_estimate", "expected_views", "views", "view_count"];

/// A creator profile as the optimizer sees it.
///
/// The normalized id, price and reach are extracted once from the raw
/// catalog record; the record itself is carried through untouched and is what
/// gets serialized back to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    id: Option<String>,
    price: Option<f64>,
    reach: Option<ReachEstimate>,
    record: Value,
}

impl Candidate {
    pub fn from_value(record: Value) -> Self {
        let Some(object) = record.as_object() else {
            return Self {
                id: None,
                price: None,
                reach: None,
                record,
            };
        };
        Self {
            id: string_from_paths(object, ID_PATHS),
            price: number_from_paths(object, PRICE_PATHS),
            reach: resolve_reach(object),
            record,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    pub fn reach(&self) -> Option<&ReachEstimate> {
        self.reach.as_ref()
    }

    pub fn reach_point(&self) -> Option<f64> {
        self.reach.as_ref().map(ReachEstimate::point)
    }

    pub fn record(&self) -> &Value {
        &self.record
    }

    pub fn is_eligible(&self) -> bool {
        matches!(
            (self.price, self.reach_point()),
            (Some(price), Some(reach)) if price > 0.0 && reach > 0.0
        )
    }

    /// Reach per unit of cost; `None` for ineligible candidates.
    pub fn efficiency(&self) -> Option<f64> {
        if !self.is_eligible() {
            return None;
        }
        Some(self.reach_point()? / self.price?)
    }

    /// Descriptive text field, for catalog filtering and display only.
    pub fn text(&self, path: &str) -> Option<String> {
        let object = self.record.as_object()?;
        object_path_value(object, path).and_then(to_text)
    }

    pub fn number(&self, path: &str) -> Option<f64> {
        let object = self.record.as_object()?;
        number_from_paths(object, &[path])
    }
}

impl From<Value> for Candidate {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

impl Serialize for Candidate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.record.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Candidate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

fn resolve_reach(object: &Map<String, Value>) -> Option<ReachEstimate> {
    REACH_PATHS
        .iter()
        .filter_map(|path| object_path_value(object, path))
        .filter_map(ReachEstimate::from_value)
        .find(|estimate| estimate.point() > 0.0)
}
