use std::sync::OnceLock;

use regex::Regex;

use crate::core::types::Page;

// Handles E-201A, FP101.2B and similar title-block codes.
fn sheet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Z]{1,3}-?\d{1,4}(?:\.\d{1,3})?[A-Z]?)\b").expect("sheet code regex")
    })
}

/// First sheet-code-looking token in the page text, or an empty string.
pub fn detect_sheet_code(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    sheet_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

pub fn fallback_sheet_code(index: usize) -> String {
    format!("PAGE-{}", index + 1)
}

pub fn sheet_code_for_page(page: &Page) -> String {
    let code = detect_sheet_code(&page.text);
    if code.is_empty() {
        fallback_sheet_code(page.index)
    } else {
        code
    }
}
