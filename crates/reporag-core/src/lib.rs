//! Configuration loading, answer synthesis, and the query pipeline.

pub mod bootstrap;
pub mod config;
pub mod pipeline;
pub mod synthesizer;
pub mod vault;

pub use pipeline::{AnswerService, RagPipeline};
pub use synthesizer::{Answer, AnswerSynthesizer};
