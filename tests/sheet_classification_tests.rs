use std::collections::HashSet;

use planscope_lib::core::types::Trade;
use planscope_lib::sheets::{
    classifier::{classify_page, guess_trade_from_sheet, likely_trades, route},
    identifier::detect_sheet_code,
};

#[test]
fn detects_sheet_code_in_title_text() {
    assert_eq!(detect_sheet_code("Sheet E-201A Lighting Plan"), "E-201A");
    assert_eq!(detect_sheet_code("FP101.2B SPRINKLER LAYOUT"), "FP101.2B");
}

#[test]
fn missing_sheet_code_is_empty() {
    assert_eq!(detect_sheet_code("general notes and legends"), "");
    assert_eq!(detect_sheet_code(""), "");
}

#[test]
fn sheet_prefixes_map_to_trades() {
    assert_eq!(guess_trade_from_sheet("E-201A"), Some(Trade::Electrical));
    assert_eq!(guess_trade_from_sheet("M101"), Some(Trade::Mechanical));
    assert_eq!(guess_trade_from_sheet("P-3"), Some(Trade::Plumbing));
    assert_eq!(guess_trade_from_sheet("FP-101"), Some(Trade::FireProtection));
    assert_eq!(guess_trade_from_sheet("F-2"), Some(Trade::FireProtection));
    assert_eq!(guess_trade_from_sheet("S2.1"), Some(Trade::Structural));
    assert_eq!(guess_trade_from_sheet("A-501"), Some(Trade::Architectural));
    assert_eq!(guess_trade_from_sheet("C-100"), Some(Trade::Civil));
    assert_eq!(guess_trade_from_sheet("e-101"), Some(Trade::Electrical));
}

#[test]
fn synthetic_and_unknown_codes_have_no_sheet_trade() {
    assert_eq!(guess_trade_from_sheet("PAGE-2"), None);
    assert_eq!(guess_trade_from_sheet("LS-1"), None);
    assert_eq!(guess_trade_from_sheet(""), None);
}

#[test]
fn keywords_and_sheet_trade_both_feed_likely_trades() {
    let likely = likely_trades(Some(&Trade::Civil), "new sprinkler riser at stair 2");
    assert!(likely.contains(&Trade::Civil));
    assert!(likely.contains(&Trade::FireProtection));
    // "riser" is shared with Plumbing.
    assert!(likely.contains(&Trade::Plumbing));
    assert!(!likely.contains(&Trade::Electrical));
}

#[test]
fn classify_page_lowercases_before_matching() {
    let classification = classify_page("M-201", "ROOFTOP UNIT RTU-1 AND SUPPLY DUCT");
    assert_eq!(classification.sheet_trade, Some(Trade::Mechanical));
    assert!(classification.likely_trades.contains(&Trade::Mechanical));
}

#[test]
fn sheet_trade_overrides_keywords_when_selected() {
    let selected = vec![Trade::Electrical, Trade::Mechanical];
    let likely: HashSet<Trade> = [Trade::Mechanical].into_iter().collect();
    assert_eq!(
        route(Some(&Trade::Electrical), &selected, &likely),
        vec![Trade::Electrical]
    );
}

#[test]
fn routing_falls_back_to_keyword_intersection_in_selection_order() {
    let selected = vec![Trade::Electrical, Trade::Plumbing];
    let likely: HashSet<Trade> = [Trade::Plumbing, Trade::Structural].into_iter().collect();
    assert_eq!(route(None, &selected, &likely), vec![Trade::Plumbing]);

    // A sheet trade the caller did not select is ignored.
    assert_eq!(
        route(Some(&Trade::Structural), &selected, &likely),
        vec![Trade::Plumbing]
    );
}

#[test]
fn intersection_follows_selection_order_not_table_order() {
    let selected = vec![Trade::Civil, Trade::Electrical];
    let likely: HashSet<Trade> = [Trade::Electrical, Trade::Civil].into_iter().collect();
    assert_eq!(
        route(None, &selected, &likely),
        vec![Trade::Civil, Trade::Electrical]
    );
}

#[test]
fn unrecognized_trades_never_route() {
    let selected = vec![Trade::from_name("Landscaping")];
    let likely = likely_trades(None, "planting plan with door and window schedule");
    assert!(route(None, &selected, &likely).is_empty());
}
