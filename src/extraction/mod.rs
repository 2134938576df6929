pub mod aggregator;
pub mod client;
pub mod pipeline;
pub mod prompts;
