use thiserror::Error;

#[derive(Error, Debug)]
pub enum NormalizerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid rule '{pattern}': {message}")]
    RuleError { pattern: String, message: String },
}

/// 錯誤分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Configuration,
    RuleTable,
    Output,
}

/// 錯誤嚴重程度（決定 CLI 退出碼）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// CLI 退出碼；Low 不視為失敗
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl NormalizerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            NormalizerError::IoError(_) => ErrorCategory::Io,
            NormalizerError::TomlError(_)
            | NormalizerError::ConfigError { .. }
            | NormalizerError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            NormalizerError::RuleError { .. } => ErrorCategory::RuleTable,
            NormalizerError::SerializationError(_) => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Output => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::RuleTable => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            NormalizerError::IoError(_) => {
                "Check that the input or config file exists and is readable"
            }
            NormalizerError::TomlError(_) => "Fix the TOML syntax in the config file",
            NormalizerError::SerializationError(_) => "Retry without --json",
            NormalizerError::ConfigError { .. } => "Check the combination of command-line options",
            NormalizerError::InvalidConfigValueError { .. } => {
                "Correct the listed field and run again"
            }
            NormalizerError::RuleError { .. } => {
                "Remove empty or duplicate patterns, then run rule-audit on the table"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            NormalizerError::IoError(e) => format!("Could not read file: {}", e),
            NormalizerError::TomlError(e) => format!("Config file is not valid TOML: {}", e),
            NormalizerError::RuleError { pattern, message } => {
                format!("Rule table problem at '{}': {}", pattern, message)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NormalizerError>;
