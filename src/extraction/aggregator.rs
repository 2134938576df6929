use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::core::types::{Qty, ScopeItem, TradeBuckets};

fn numeric_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("numeric qty regex"))
}

/// Concatenates per-chunk results in chunk order, dropping items without a name.
pub fn merge_chunks(chunks: Vec<Vec<ScopeItem>>) -> Vec<ScopeItem> {
    chunks
        .into_iter()
        .flatten()
        .filter(|item| !item.item.trim().is_empty())
        .collect()
}

/// First occurrence of each `(item, sheet)` key wins; order is preserved.
pub fn dedupe(items: Vec<ScopeItem>) -> Vec<ScopeItem> {
    let mut seen = HashSet::new();
    let mut ordered = vec![];
    for item in items {
        if item.item.is_empty() {
            continue;
        }
        if seen.insert(item.dedupe_key()) {
            ordered.push(item);
        }
    }
    ordered
}

pub fn aggregate_page(chunks: Vec<Vec<ScopeItem>>) -> Vec<ScopeItem> {
    dedupe(merge_chunks(chunks))
}

pub fn coerce_qty(qty: &Qty) -> Option<Qty> {
    let value = match qty {
        Qty::Integer(_) => return None,
        Qty::Float(value) => *value,
        Qty::Text(text) => {
            let trimmed = text.trim();
            if !numeric_regex().is_match(trimmed) {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
    };
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(Qty::Integer(value as i64))
    } else if matches!(qty, Qty::Float(_)) {
        None
    } else {
        Some(Qty::Float(value))
    }
}

/// Final pass over every bucket; quantities that are not plainly numeric stay as they are.
pub fn coerce_quantities(buckets: &mut TradeBuckets) {
    for bucket in buckets.iter_mut() {
        for item in bucket.items.iter_mut() {
            if let Some(qty) = coerce_qty(&item.qty) {
                item.qty = qty;
            }
        }
    }
}
