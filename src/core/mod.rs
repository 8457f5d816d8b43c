pub mod audit;
pub mod chunker;
pub mod cleanup;
pub mod lecture;
pub mod normalizer;
pub mod pipeline;
pub mod rule_table;

pub use crate::domain::model::{NormalizationReport, ResponsePath, Rule, SpeechOutput};
pub use crate::domain::ports::TextStage;
pub use crate::utils::error::Result;
