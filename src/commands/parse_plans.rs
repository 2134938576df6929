use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::{
    core::{
        config::Settings,
        errors::{AppError, AppResult},
        types::{ParsePlansResponse, PlanTier, Trade, UserContext},
    },
    document::reader,
    AppState,
};

pub const ANONYMOUS_UID: &str = "local-anonymous";

/// An uploaded plan set as received from the transport layer.
#[derive(Debug, Clone)]
pub struct PlanUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Validates the request, reads the PDF and runs the scope pipeline.
///
/// Any panic below this point is reported as a generic internal error rather
/// than tearing down the caller.
pub async fn parse_plans(
    state: &AppState,
    user: UserContext,
    upload: PlanUpload,
    trades_json: &str,
) -> AppResult<ParsePlansResponse> {
    let started = Instant::now();
    let outcome = AssertUnwindSafe(run_request(state, user, upload, trades_json))
        .catch_unwind()
        .await
        .unwrap_or_else(|_| Err(AppError::Internal("internal_error".to_string())));

    let latency_ms = started.elapsed().as_millis() as u64;
    match &outcome {
        Ok(response) => info!(
            latency_ms,
            trades = response.trades.len(),
            items = response.results.total_items(),
            "parse_plans completed"
        ),
        Err(err @ AppError::Internal(_)) => error!(latency_ms, error = %err, "parse_plans failed"),
        Err(err) => info!(latency_ms, code = err.code(), "parse_plans rejected"),
    }
    outcome
}

async fn run_request(
    state: &AppState,
    user: UserContext,
    upload: PlanUpload,
    trades_json: &str,
) -> AppResult<ParsePlansResponse> {
    let user = authorize(user, &state.settings)?;
    debug!(uid = user.uid.as_deref().unwrap_or_default(), plan = ?user.plan, "caller authorized");
    validate_upload(&upload, &state.settings)?;
    let selected = parse_trades(trades_json)?;

    let max_pages = state.settings.max_pages;
    let bytes = upload.bytes;
    let pages = state
        .pool
        .run(move || reader::read_pages_from_mem(&bytes, max_pages))
        .await??;

    let trades: Vec<Trade> = selected.iter().map(|name| Trade::from_name(name)).collect();
    let results = state.pipeline.run(pages, &trades).await?;

    Ok(ParsePlansResponse {
        trades: selected,
        results,
    })
}

/// Free-tier callers must identify themselves unless anonymous use is enabled.
pub fn authorize(mut user: UserContext, settings: &Settings) -> AppResult<UserContext> {
    let has_uid = user.uid.as_deref().is_some_and(|uid| !uid.trim().is_empty());
    if !has_uid && settings.allow_anonymous {
        user.uid = Some(ANONYMOUS_UID.to_string());
        return Ok(user);
    }
    if user.plan == PlanTier::Free && !has_uid {
        return Err(AppError::Unauthorized(
            "Sign in required for free tier.".to_string(),
        ));
    }
    Ok(user)
}

pub fn validate_upload(upload: &PlanUpload, settings: &Settings) -> AppResult<()> {
    let is_pdf_type = upload
        .content_type
        .as_deref()
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("application/pdf"));
    let is_pdf_name = upload.file_name.to_ascii_lowercase().ends_with(".pdf");
    if !is_pdf_type && !is_pdf_name {
        return Err(AppError::UnsupportedFile(
            "Only PDF files are supported.".to_string(),
        ));
    }

    let size = upload.bytes.len() as u64;
    if size > settings.max_pdf_bytes() {
        let mb = size as f64 / (1024.0 * 1024.0);
        return Err(AppError::PayloadTooLarge(format!(
            "PDF too large ({mb:.1} MB). Max {} MB.",
            settings.max_pdf_mb
        )));
    }
    Ok(())
}

/// Parses the caller's JSON trade list. Repeated names are kept once.
pub fn parse_trades(trades_json: &str) -> AppResult<Vec<String>> {
    let value: Value = serde_json::from_str(trades_json)
        .map_err(|_| AppError::InvalidInput("Invalid trades list (JSON).".to_string()))?;
    let invalid = || AppError::InvalidInput("Invalid or empty trades list.".to_string());

    let items = value.as_array().ok_or_else(invalid)?;
    if items.is_empty() {
        return Err(invalid());
    }
    let mut trades: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let name = item.as_str().ok_or_else(invalid)?;
        if !trades.iter().any(|existing| existing == name) {
            trades.push(name.to_string());
        }
    }
    Ok(trades)
}
