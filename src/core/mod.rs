pub mod config;
pub mod errors;
pub mod pool;
pub mod types;
