pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::toml_config::TomlConfig;
pub use core::{
    audit::{audit, RuleConflict},
    normalizer::Normalizer,
    pipeline::SpeechPipeline,
    rule_table::RuleTable,
};
pub use domain::model::{
    NormalizationReport, ResponsePath, Rule, RuleEntry, RuleKind, RuleOrder, SpeechOutput,
};
pub use utils::error::{NormalizerError, Result};
