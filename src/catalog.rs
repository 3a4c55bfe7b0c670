use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::candidate::fields::object_get_case_insensitive;
use crate::candidate::Candidate;

const SUBSCRIBERS: &str = "subscriber_count";
const CATEGORY: &str = "category";
const ARCHETYPE: &str = "archetype.archetype_primary";
const COUNTRY: &str = "country";
const LANGUAGE: &str = "language.primary_language";
const SEARCH_FIELDS: &[&str] = &["title", "description", "keywords"];

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub candidates: Vec<Candidate>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed reading catalog: {}", path.display()))?;
        let value: Value = serde_json::from_str(&data)
            .with_context(|| format!("invalid catalog JSON: {}", path.display()))?;
        Self::from_value(value)
    }

    /// Accepts a bare array of records or an object wrapping one.
    pub fn from_value(value: Value) -> Result<Self> {
        let entries = match value {
            Value::Array(entries) => entries,
            Value::Object(object) => ["kols", "candidates"]
                .iter()
                .find_map(|key| object_get_case_insensitive(&object, key))
                .and_then(Value::as_array)
                .cloned()
                .ok_or_else(|| anyhow!("catalog object has no kols array"))?,
            _ => return Err(anyhow!("catalog must be a JSON array or object")),
        };
        Ok(Self {
            candidates: entries.into_iter().map(Candidate::from_value).collect(),
        })
    }

    pub fn filter(&self, filter: &CatalogFilter) -> Vec<Candidate> {
        self.candidates
            .iter()
            .filter(|candidate| filter.matches(candidate))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogFilter {
    pub min_subscribers: Option<f64>,
    pub max_subscribers: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub archetypes: Vec<String>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub search: Option<String>,
}

impl CatalogFilter {
    pub fn is_active(&self) -> bool {
        self.min_subscribers.is_some()
            || self.max_subscribers.is_some()
            || self.min_price.is_some()
            || self.max_price.is_some()
            || !self.categories.is_empty()
            || !self.archetypes.is_empty()
            || !self.countries.is_empty()
            || !self.languages.is_empty()
            || self.search_query().is_some()
    }

    pub fn matches(&self, candidate: &Candidate) -> bool {
        within(candidate.number(SUBSCRIBERS), self.min_subscribers, self.max_subscribers)
            && within(candidate.price(), self.min_price, self.max_price)
            && one_of(candidate.text(CATEGORY), &self.categories)
            && one_of(candidate.text(ARCHETYPE), &self.archetypes)
            && one_of(candidate.text(COUNTRY), &self.countries)
            && one_of(candidate.text(LANGUAGE), &self.languages)
            && self.matches_search(candidate)
    }

    fn search_query(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
            .map(str::to_lowercase)
    }

    fn matches_search(&self, candidate: &Candidate) -> bool {
        let Some(query) = self.search_query() else {
            return true;
        };
        SEARCH_FIELDS.iter().any(|field| {
            candidate
                .text(field)
                .is_some_and(|text| text.to_lowercase().contains(&query))
        })
    }
}

// A bound applies only when set; a record missing the value fails any set bound.
fn within(value: Option<f64>, min: Option<f64>, max: Option<f64>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}

fn one_of(value: Option<String>, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    value.is_some_and(|value| allowed.iter().any(|a| a == &value))
}

/// Distinct values available for each set filter, sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub archetypes: Vec<String>,
    pub languages: Vec<String>,
    pub countries: Vec<String>,
}

impl FilterOptions {
    pub fn from_candidates(candidates: &[Candidate]) -> Self {
        let distinct = |path: &str| {
            candidates
                .iter()
                .filter_map(|candidate| candidate.text(path))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect::<Vec<_>>()
        };
        Self {
            categories: distinct(CATEGORY),
            archetypes: distinct(ARCHETYPE),
            languages: distinct(LANGUAGE),
            countries: distinct(COUNTRY),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_value(json!({
            "kols": [
                {
                    "channel_id": "UC1",
                    "title": "DeFi Daily",
                    "description": "Yield farming walkthroughs",
                    "keywords": "defi,yield",
                    "subscriber_count": 120000,
                    "price": 1500,
                    "category": "DeFi",
                    "country": "US",
                    "archetype": { "archetype_primary": "Educator" },
                    "language": { "primary_language": "en" }
                },
                {
                    "channel_id": "UC2",
                    "title": "NFT Nights",
                    "description": "Mint reviews",
                    "keywords": "nft,art",
                    "subscriber_count": 8000,
                    "price": 300,
                    "category": "NFT",
                    "country": "VN",
                    "archetype": "unknown",
                    "language": { "primary_language": "vi" }
                },
                {
                    "channel_id": "UC3",
                    "title": "Chart Room",
                    "description": "Technical analysis",
                    "keywords": "trading",
                    "subscriber_count": 45000,
                    "category": "Trading",
                    "country": "US"
                }
            ]
        }))
        .expect("catalog")
    }

    fn channel_ids(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().filter_map(Candidate::id).collect()
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let filter = CatalogFilter::default();
        assert!(!filter.is_active());
        assert_eq!(catalog().filter(&filter).len(), 3);
    }

    #[test]
    fn ranges_and_sets_narrow_the_list() {
        let catalog = catalog();
        let filter = CatalogFilter {
            min_subscribers: Some(10_000.0),
            countries: vec!["US".to_string()],
            ..CatalogFilter::default()
        };
        assert!(filter.is_active());
        assert_eq!(channel_ids(&catalog.filter(&filter)), vec!["UC1", "UC3"]);

        let priced = CatalogFilter {
            max_price: Some(1000.0),
            ..CatalogFilter::default()
        };
        assert_eq!(channel_ids(&catalog.filter(&priced)), vec!["UC2"]);
    }

    #[test]
    fn nested_archetype_and_language_filters() {
        let catalog = catalog();
        let filter = CatalogFilter {
            archetypes: vec!["Educator".to_string()],
            ..CatalogFilter::default()
        };
        assert_eq!(channel_ids(&catalog.filter(&filter)), vec!["UC1"]);

        let filter = CatalogFilter {
            languages: vec!["vi".to_string()],
            ..CatalogFilter::default()
        };
        assert_eq!(channel_ids(&catalog.filter(&filter)), vec!["UC2"]);
    }

    #[test]
    fn search_is_case_insensitive_over_text_fields() {
        let catalog = catalog();
        let filter = CatalogFilter {
            search: Some("  YIELD ".to_string()),
            ..CatalogFilter::default()
        };
        assert_eq!(channel_ids(&catalog.filter(&filter)), vec!["UC1"]);

        let blank = CatalogFilter {
            search: Some("   ".to_string()),
            ..CatalogFilter::default()
        };
        assert!(!blank.is_active());
    }

    #[test]
    fn collects_sorted_distinct_options() {
        let options = FilterOptions::from_candidates(&catalog().candidates);
        assert_eq!(options.categories, vec!["DeFi", "NFT", "Trading"]);
        assert_eq!(options.countries, vec!["US", "VN"]);
        assert_eq!(options.archetypes, vec!["Educator"]);
        assert_eq!(options.languages, vec!["en", "vi"]);
    }

    #[test]
    fn accepts_bare_array_and_rejects_scalars() {
        let catalog = Catalog::from_value(json!([{ "channel_id": "UC9" }])).expect("array");
        assert_eq!(catalog.candidates.len(), 1);
        assert!(Catalog::from_value(json!(42)).is_err());
        assert!(Catalog::from_value(json!({ "items": [] })).is_err());
    }
}
