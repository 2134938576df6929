use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    core::{
        config::MAX_PARSE_ATTEMPTS,
        errors::AppResult,
        pool::BlockingPool,
        types::{Qty, ScopeItem, Trade},
    },
    extraction::prompts::build_messages,
    providers::{ChatMessage, ExtractionOracle},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    Records(Vec<Value>),
    /// Valid JSON whose top level is not an array.
    WrongShape,
}

/// Calls the oracle for one (trade, sheet, chunk) and turns whatever comes
/// back into scope items. Malformed output never escapes as an error; provider
/// failures do.
#[derive(Clone)]
pub struct ExtractionClient {
    oracle: Arc<dyn ExtractionOracle>,
    pool: BlockingPool,
    max_attempts: usize,
}

impl ExtractionClient {
    pub fn new(oracle: Arc<dyn ExtractionOracle>, pool: BlockingPool) -> Self {
        Self {
            oracle,
            pool,
            max_attempts: MAX_PARSE_ATTEMPTS,
        }
    }

    pub async fn extract(
        &self,
        trade: &Trade,
        sheet_code: &str,
        chunk: &str,
    ) -> AppResult<Vec<ScopeItem>> {
        let messages = build_messages(trade, sheet_code, chunk);
        let records = self.call_json(messages).await?;
        Ok(records
            .into_iter()
            .filter_map(|value| match value {
                Value::Object(object) => Some(normalize_record(object, sheet_code)),
                _ => None,
            })
            .collect())
    }

    async fn call_json(&self, messages: Vec<ChatMessage>) -> AppResult<Vec<Value>> {
        let messages = Arc::new(messages);
        for attempt in 1..=self.max_attempts {
            let oracle = Arc::clone(&self.oracle);
            let request = Arc::clone(&messages);
            let raw = self.pool.run(move || oracle.complete(&request)).await??;

            match parse_response(&raw) {
                Ok(ParsedResponse::Records(records)) => return Ok(records),
                Ok(ParsedResponse::WrongShape) => {
                    debug!(attempt, "oracle returned JSON that is not an array");
                    return Ok(vec![]);
                }
                Err(err) => {
                    warn!(
                        oracle = self.oracle.name(),
                        attempt,
                        error = %err,
                        "oracle output is not JSON"
                    );
                }
            }
        }
        warn!(
            attempts = self.max_attempts,
            "giving up on chunk; no records extracted"
        );
        Ok(vec![])
    }
}

pub fn parse_response(raw: &str) -> Result<ParsedResponse, serde_json::Error> {
    let content = strip_code_fence(raw.trim());
    match serde_json::from_str::<Value>(content)? {
        Value::Array(records) => Ok(ParsedResponse::Records(records)),
        _ => Ok(ParsedResponse::WrongShape),
    }
}

// Models sometimes wrap the array in ```json fences despite the prompt.
fn strip_code_fence(content: &str) -> &str {
    let Some(inner) = content.strip_prefix("```") else {
        return content;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return content;
    };
    match inner.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => inner[4..].trim(),
        _ => inner.trim(),
    }
}

pub fn normalize_record(mut object: Map<String, Value>, sheet_code: &str) -> ScopeItem {
    let item = text_field(object.remove("item"));
    let notes = text_field(object.remove("notes"));
    let sheet = match text_field(object.remove("sheet")) {
        sheet if sheet.is_empty() => sheet_code.trim().to_string(),
        sheet => sheet,
    };
    let qty = qty_field(object.remove("qty"));
    ScopeItem {
        item,
        qty,
        notes,
        sheet,
    }
}

fn text_field(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

fn qty_field(value: Option<Value>) -> Qty {
    match value {
        None | Some(Value::Null) => Qty::empty(),
        Some(Value::String(text)) => Qty::Text(text),
        Some(Value::Number(number)) => match number.as_i64() {
            Some(whole) => Qty::Integer(whole),
            None => number
                .as_f64()
                .map(Qty::Float)
                .unwrap_or_else(|| Qty::Text(number.to_string())),
        },
        Some(other) => Qty::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_arrays_are_unwrapped() {
        let parsed = parse_response("```json\n[{\"item\":\"AHU-1\"}]\n```").expect("valid JSON");
        assert!(matches!(parsed, ParsedResponse::Records(records) if records.len() == 1));
    }

    #[test]
    fn fence_tag_is_case_insensitive() {
        let parsed = parse_response("```JSON\n[{\"item\":\"AHU-1\"}]\n```").expect("valid JSON");
        assert!(matches!(parsed, ParsedResponse::Records(records) if records.len() == 1));
        let parsed = parse_response("```\n[]\n```").expect("untagged fence");
        assert_eq!(parsed, ParsedResponse::Records(vec![]));
    }

    #[test]
    fn objects_are_wrong_shape_not_errors() {
        assert_eq!(
            parse_response("{\"items\": []}").expect("valid JSON"),
            ParsedResponse::WrongShape
        );
        assert_eq!(parse_response("42").expect("valid JSON"), ParsedResponse::WrongShape);
    }

    #[test]
    fn chatter_is_a_parse_error() {
        assert!(parse_response("Sure! Here are the items:").is_err());
    }

    #[test]
    fn missing_fields_are_backfilled() {
        let object = serde_json::json!({"item": "  Floor Drain FD-1 "})
            .as_object()
            .cloned()
            .expect("object");
        let item = normalize_record(object, "P-201");
        assert_eq!(item.item, "Floor Drain FD-1");
        assert_eq!(item.sheet, "P-201");
        assert_eq!(item.qty, Qty::empty());
        assert_eq!(item.notes, "");
    }

    #[test]
    fn non_string_fields_are_coerced_to_text() {
        let object = serde_json::json!({"item": 42, "qty": 2.5, "notes": null, "sheet": " m-101 "})
            .as_object()
            .cloned()
            .expect("object");
        let item = normalize_record(object, "M-101");
        assert_eq!(item.item, "42");
        assert_eq!(item.qty, Qty::Float(2.5));
        assert_eq!(item.notes, "");
        assert_eq!(item.sheet, "m-101");
    }

    #[test]
    fn non_scalar_qty_is_kept_as_json_text() {
        let object = serde_json::json!({"item": "Hose bibb", "qty": true})
            .as_object()
            .cloned()
            .expect("object");
        assert_eq!(normalize_record(object, "P-101").qty, Qty::Text("true".to_string()));

        let object = serde_json::json!({"item": "Hose bibb", "qty": {"count": 2}})
            .as_object()
            .cloned()
            .expect("object");
        assert_eq!(
            normalize_record(object, "P-101").qty,
            Qty::Text("{\"count\":2}".to_string())
        );
    }
}
