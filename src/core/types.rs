use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
}

/// A construction discipline. Names outside the fixed set are carried as
/// `Other` and never match a classifier table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Trade {
    Electrical,
    Mechanical,
    Plumbing,
    FireProtection,
    Structural,
    Architectural,
    Civil,
    Other(String),
}

impl Trade {
    pub const KNOWN: [Trade; 7] = [
        Trade::Electrical,
        Trade::Mechanical,
        Trade::Plumbing,
        Trade::FireProtection,
        Trade::Structural,
        Trade::Architectural,
        Trade::Civil,
    ];

    pub fn from_name(raw: &str) -> Self {
        match raw {
            "Electrical" => Self::Electrical,
            "Mechanical" => Self::Mechanical,
            "Plumbing" => Self::Plumbing,
            "Fire Protection" => Self::FireProtection,
            "Structural" => Self::Structural,
            "Architectural" => Self::Architectural,
            "Civil" => Self::Civil,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Electrical => "Electrical",
            Self::Mechanical => "Mechanical",
            Self::Plumbing => "Plumbing",
            Self::FireProtection => "Fire Protection",
            Self::Structural => "Structural",
            Self::Architectural => "Architectural",
            Self::Civil => "Civil",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Trade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Trade {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Trade::from_name(&raw))
    }
}

/// One page of extracted plan text. `index` is zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub index: usize,
    pub text: String,
}

impl Page {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Qty {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Qty {
    pub fn empty() -> Self {
        Self::Text(String::new())
    }
}

impl Default for Qty {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeItem {
    pub item: String,
    pub qty: Qty,
    pub notes: String,
    pub sheet: String,
}

impl ScopeItem {
    /// Case and whitespace insensitive identity used for deduplication.
    pub fn dedupe_key(&self) -> (String, String) {
        (
            self.item.trim().to_lowercase(),
            self.sheet.trim().to_lowercase(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeBucket {
    pub trade: Trade,
    pub items: Vec<ScopeItem>,
}

/// Per-trade results in caller selection order. Serializes as a JSON object
/// keyed by trade name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeBuckets {
    buckets: Vec<TradeBucket>,
}

impl TradeBuckets {
    pub fn for_trades(trades: &[Trade]) -> Self {
        let mut buckets: Vec<TradeBucket> = Vec::with_capacity(trades.len());
        for trade in trades {
            if buckets.iter().any(|bucket| &bucket.trade == trade) {
                continue;
            }
            buckets.push(TradeBucket {
                trade: trade.clone(),
                items: vec![],
            });
        }
        Self { buckets }
    }

    pub fn get(&self, trade: &Trade) -> Option<&[ScopeItem]> {
        self.buckets
            .iter()
            .find(|bucket| &bucket.trade == trade)
            .map(|bucket| bucket.items.as_slice())
    }

    pub fn extend(&mut self, trade: &Trade, items: Vec<ScopeItem>) {
        if let Some(bucket) = self.buckets.iter_mut().find(|bucket| &bucket.trade == trade) {
            bucket.items.extend(items);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TradeBucket> {
        self.buckets.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TradeBucket> {
        self.buckets.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total_items(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.items.len()).sum()
    }
}

impl Serialize for TradeBuckets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for bucket in &self.buckets {
            map.serialize_entry(bucket.trade.as_str(), &bucket.items)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
    Other(String),
}

impl PlanTier {
    pub fn from_name(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "free" => Self::Free,
            "pro" => Self::Pro,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserContext {
    pub uid: Option<String>,
    pub plan: PlanTier,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParsePlansResponse {
    pub trades: Vec<String>,
    pub results: TradeBuckets,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_names_round_trip_and_unknown_names_stay_opaque() {
        assert_eq!(Trade::from_name("Fire Protection"), Trade::FireProtection);
        assert_eq!(Trade::FireProtection.to_string(), "Fire Protection");
        let custom = Trade::from_name("Landscaping");
        assert_eq!(custom, Trade::Other("Landscaping".to_string()));
        assert_eq!(custom.as_str(), "Landscaping");
        // Matching is exact; a lowercase name is opaque.
        assert_eq!(
            Trade::from_name("electrical"),
            Trade::Other("electrical".to_string())
        );
    }

    #[test]
    fn buckets_serialize_in_selection_order_with_empty_lists() {
        let trades = vec![Trade::Plumbing, Trade::Electrical];
        let mut buckets = TradeBuckets::for_trades(&trades);
        buckets.extend(
            &Trade::Electrical,
            vec![ScopeItem {
                item: "Panelboard PB-1".to_string(),
                qty: Qty::Integer(4),
                notes: String::new(),
                sheet: "E-101".to_string(),
            }],
        );

        let json = serde_json::to_string(&buckets).expect("buckets should serialize");
        assert_eq!(
            json,
            r#"{"Plumbing":[],"Electrical":[{"item":"Panelboard PB-1","qty":4,"notes":"","sheet":"E-101"}]}"#
        );
    }

    #[test]
    fn duplicate_selection_collapses_to_one_bucket() {
        let buckets = TradeBuckets::for_trades(&[Trade::Civil, Trade::Civil]);
        assert_eq!(buckets.len(), 1);
    }

    #[test]
    fn plan_tier_defaults_to_free() {
        assert_eq!(PlanTier::from_name(""), PlanTier::Free);
        assert_eq!(PlanTier::from_name(" Pro "), PlanTier::Pro);
        assert_eq!(UserContext::default().plan, PlanTier::Free);
    }
}
