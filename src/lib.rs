pub mod commands;
pub mod core;
pub mod document;
pub mod extraction;
pub mod providers;
pub mod security;
pub mod sheets;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::core::{config::Settings, errors::AppResult, pool::BlockingPool};
use crate::extraction::{client::ExtractionClient, pipeline::ScopePipeline};
use crate::providers::ExtractionOracle;

fn log_filter_from_env() -> EnvFilter {
    let level = std::env::var("PLANSCOPE_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .to_ascii_lowercase();
    EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter_from_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Everything a request needs. The pool is shared by every clone.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub pool: BlockingPool,
    pub pipeline: ScopePipeline,
}

impl AppState {
    pub fn new(settings: Settings, oracle: Arc<dyn ExtractionOracle>) -> AppResult<Self> {
        settings.validate()?;
        let pool = BlockingPool::new(settings.parser_workers);
        let client = ExtractionClient::new(oracle, pool.clone());
        let pipeline = ScopePipeline::new(client).with_max_chunk_chars(settings.max_chunk_chars);
        Ok(Self {
            settings,
            pool,
            pipeline,
        })
    }
}
