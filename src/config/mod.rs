pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::ResponsePath;
#[cfg(feature = "cli")]
use crate::utils::error::{NormalizerError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_path, validate_range, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::Serialize;
#[cfg(feature = "cli")]
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Parser)]
#[command(name = "tts-normalize")]
#[command(about = "Rewrite LLM output into text a speech synthesizer pronounces correctly")]
pub struct CliConfig {
    /// Input text file (reads stdin when omitted)
    #[arg(short, long)]
    pub input: Option<String>,

    /// Rule table TOML file (built-in rules when omitted)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Response path the text belongs to
    #[arg(long, value_enum, default_value_t = ResponsePath::Chat)]
    pub path: ResponsePath,

    /// Only apply the rule table, skip cleanup, formatting and chunking
    #[arg(long)]
    pub normalize_only: bool,

    /// Print one TTS chunk per line
    #[arg(long)]
    pub chunks: bool,

    /// Print a JSON report instead of plain text
    #[arg(long)]
    pub json: bool,

    /// List the rules that fired on stderr
    #[arg(long)]
    pub explain: bool,

    /// Override chunking.max_chars from the config
    #[arg(long)]
    pub max_chunk_chars: Option<usize>,

    /// Override chunking.max_total_chars from the config
    #[arg(long)]
    pub max_total_chars: Option<usize>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入規則配置並套用命令列覆蓋設定
    pub fn load_settings(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::builtin()?,
        };

        if let Some(max_chars) = self.max_chunk_chars {
            config.chunking.max_chars = max_chars;
            tracing::info!("🔧 chunking.max_chars overridden to: {}", max_chars);
        }
        if let Some(max_total) = self.max_total_chars {
            config.chunking.max_total_chars = Some(max_total);
            tracing::info!("🔧 chunking.max_total_chars overridden to: {}", max_total);
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(input) = &self.input {
            validate_path("input", input)?;
        }
        if let Some(config) = &self.config {
            validate_path("config", config)?;
        }
        if let Some(max_chars) = self.max_chunk_chars {
            validate_range("max_chunk_chars", max_chars, 16, 100_000)?;
        }
        // --normalize-only 不做分段與截斷
        let chunking_requested =
            self.chunks || self.max_chunk_chars.is_some() || self.max_total_chars.is_some();
        if self.normalize_only && chunking_requested {
            return Err(NormalizerError::ConfigError {
                message: "--normalize-only cannot be combined with chunking options".to_string(),
            });
        }
        Ok(())
    }
}
