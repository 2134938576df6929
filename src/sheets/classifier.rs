use std::collections::HashSet;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use crate::core::types::Trade;

/// Sheet prefix patterns, tested in order against the sheet code. The bare
/// `F` pattern is tolerant on purpose and shares Fire Protection with `FP`.
const SHEET_TRADE_PATTERNS: &[(&str, Trade)] = &[
    (r"^E[\d\-]", Trade::Electrical),
    (r"^M[\d\-]", Trade::Mechanical),
    (r"^P[\d\-]", Trade::Plumbing),
    (r"^FP[\d\-]", Trade::FireProtection),
    (r"^F[P]?\-?\d", Trade::FireProtection),
    (r"^S[\d\-]", Trade::Structural),
    (r"^A[\d\-]", Trade::Architectural),
    (r"^C[\d\-]", Trade::Civil),
];

const TRADE_KEYWORDS: &[(Trade, &[&str])] = &[
    (
        Trade::Electrical,
        &[
            "panel",
            "panelboard",
            "lighting",
            "fixture",
            "switchgear",
            "conduit",
            "feeder",
            "disconnect",
            "receptacle",
        ],
    ),
    (
        Trade::Mechanical,
        &[
            "ahu",
            "vav",
            "rtu",
            "duct",
            "chiller",
            "boiler",
            "diffuser",
            "grille",
            "condensing",
            "fan coil",
        ],
    ),
    (
        Trade::Plumbing,
        &[
            "wc",
            "lav",
            "floor drain",
            "cleanout",
            "pipe",
            "riser",
            "water heater",
            "backflow",
        ],
    ),
    (
        Trade::FireProtection,
        &[
            "sprinkler",
            "riser",
            "flow switch",
            "tamper",
            "fp",
            "f.p.",
            "standpipe",
            "fire pump",
        ],
    ),
    (
        Trade::Structural,
        &[
            "beam",
            "column",
            "joist",
            "rebar",
            "foundation",
            "grade beam",
            "slab",
        ],
    ),
    (
        Trade::Architectural,
        &[
            "door",
            "finish",
            "partition",
            "window",
            "ceiling",
            "wall type",
            "millwork",
        ],
    ),
    (
        Trade::Civil,
        &[
            "utility",
            "grading",
            "storm",
            "sanitary",
            "water line",
            "site plan",
        ],
    ),
];

fn sheet_trade_table() -> &'static [(Regex, Trade)] {
    static TABLE: OnceLock<Vec<(Regex, Trade)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        SHEET_TRADE_PATTERNS
            .iter()
            .map(|(pattern, trade)| {
                let re = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .expect("sheet trade pattern");
                (re, trade.clone())
            })
            .collect()
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageClassification {
    pub sheet_trade: Option<Trade>,
    pub likely_trades: HashSet<Trade>,
}

pub fn guess_trade_from_sheet(sheet_code: &str) -> Option<Trade> {
    sheet_trade_table()
        .iter()
        .find(|(re, _)| re.is_match(sheet_code))
        .map(|(_, trade)| trade.clone())
}

/// Trades hinted at by the page text. `lower_text` must already be lowercase.
pub fn likely_trades(sheet_trade: Option<&Trade>, lower_text: &str) -> HashSet<Trade> {
    let mut trades: HashSet<Trade> = TRADE_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|keyword| lower_text.contains(keyword)))
        .map(|(trade, _)| trade.clone())
        .collect();
    if let Some(trade) = sheet_trade {
        trades.insert(trade.clone());
    }
    trades
}

pub fn classify_page(sheet_code: &str, text: &str) -> PageClassification {
    let sheet_trade = guess_trade_from_sheet(sheet_code);
    let likely_trades = likely_trades(sheet_trade.as_ref(), &text.to_lowercase());
    PageClassification {
        sheet_trade,
        likely_trades,
    }
}

/// Target trades for one page.
///
/// A sheet-code trade the caller selected wins outright; otherwise the page
/// goes to every selected trade the keywords hinted at, in selection order.
pub fn route(
    sheet_trade: Option<&Trade>,
    selected_trades: &[Trade],
    likely_trades: &HashSet<Trade>,
) -> Vec<Trade> {
    if let Some(trade) = sheet_trade {
        if selected_trades.contains(trade) {
            return vec![trade.clone()];
        }
    }
    selected_trades
        .iter()
        .filter(|trade| likely_trades.contains(*trade))
        .cloned()
        .collect()
}
