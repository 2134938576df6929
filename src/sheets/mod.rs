pub mod chunker;
pub mod classifier;
pub mod identifier;
