use std::time::Instant;

use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::{
    core::{
        errors::AppResult,
        types::{Page, Trade, TradeBuckets},
    },
    extraction::{
        aggregator::{aggregate_page, coerce_quantities},
        client::ExtractionClient,
    },
    sheets::{
        chunker::{chunk_text, DEFAULT_MAX_CHARS},
        classifier::{classify_page, route},
        identifier::sheet_code_for_page,
    },
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub pages_seen: usize,
    pub pages_blank: usize,
    pub pages_unrouted: usize,
    pub extraction_calls: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub buckets: TradeBuckets,
    pub stats: RunStats,
}

/// Drives pages through sheet detection, routing, chunked extraction and
/// aggregation. Work is strictly sequential: pages by ascending index, chunks
/// left to right, trades in selection order.
#[derive(Clone)]
pub struct ScopePipeline {
    client: ExtractionClient,
    max_chunk_chars: usize,
}

impl ScopePipeline {
    pub fn new(client: ExtractionClient) -> Self {
        Self {
            client,
            max_chunk_chars: DEFAULT_MAX_CHARS,
        }
    }

    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars.max(1);
        self
    }

    pub async fn run(&self, pages: Vec<Page>, selected_trades: &[Trade]) -> AppResult<TradeBuckets> {
        Ok(self.run_with_stats(pages, selected_trades).await?.buckets)
    }

    pub async fn run_with_stats(
        &self,
        mut pages: Vec<Page>,
        selected_trades: &[Trade],
    ) -> AppResult<PipelineOutput> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("scope_run", run_id = %run_id, pages = pages.len());
        pages.sort_by_key(|page| page.index);
        self.process(pages, selected_trades).instrument(span).await
    }

    async fn process(&self, pages: Vec<Page>, selected_trades: &[Trade]) -> AppResult<PipelineOutput> {
        let started = Instant::now();
        let mut buckets = TradeBuckets::for_trades(selected_trades);
        let mut stats = RunStats::default();

        for page in &pages {
            stats.pages_seen += 1;
            if page.text.trim().is_empty() {
                stats.pages_blank += 1;
                continue;
            }

            let sheet_code = sheet_code_for_page(page);
            let classification = classify_page(&sheet_code, &page.text);
            let targets = route(
                classification.sheet_trade.as_ref(),
                selected_trades,
                &classification.likely_trades,
            );
            debug!(
                page = page.index,
                sheet = %sheet_code,
                sheet_trade = ?classification.sheet_trade,
                targets = ?targets,
                "routed page"
            );
            if targets.is_empty() {
                stats.pages_unrouted += 1;
                continue;
            }

            let chunks = chunk_text(&page.text, self.max_chunk_chars);
            for trade in &targets {
                let mut per_chunk = vec![];
                for chunk in chunks.clone() {
                    stats.extraction_calls += 1;
                    per_chunk.push(self.client.extract(trade, &sheet_code, chunk).await?);
                }
                let items = aggregate_page(per_chunk);
                debug!(page = page.index, trade = %trade, items = items.len(), "aggregated page");
                buckets.extend(trade, items);
            }
        }

        coerce_quantities(&mut buckets);

        info!(
            pages_seen = stats.pages_seen,
            pages_blank = stats.pages_blank,
            pages_unrouted = stats.pages_unrouted,
            extraction_calls = stats.extraction_calls,
            items = buckets.total_items(),
            latency_ms = started.elapsed().as_millis() as u64,
            "scope run complete"
        );

        Ok(PipelineOutput { buckets, stats })
    }
}
