use crate::core::chunker::DEFAULT_MAX_CHUNK_CHARS;
use crate::core::lecture::{DEFAULT_PARAGRAPH_PAUSE, DEFAULT_SENTENCE_PAUSE};
use crate::core::rule_table::RuleTable;
use crate::domain::model::{Rule, RuleEntry, RuleOrder};
use crate::utils::error::{NormalizerError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_rule_pattern, Validate,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 內建規則表（編譯進執行檔）
pub const BUILTIN_RULES_TOML: &str = include_str!("../../rules/default.toml");

static RE_ENV_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// 為 true 時，本檔規則接在內建規則之後
    #[serde(default)]
    pub extends_builtin: bool,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub lecture: LectureConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub order: RuleOrder,
    #[serde(default)]
    pub entries: Vec<RuleEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LectureConfig {
    pub extra_rules: Vec<RuleEntry>,
    pub sentence_pause: String,
    pub paragraph_pause: String,
    pub closing: Option<String>,
}

impl Default for LectureConfig {
    fn default() -> Self {
        Self {
            extra_rules: Vec::new(),
            sentence_pause: DEFAULT_SENTENCE_PAUSE.to_string(),
            paragraph_pause: DEFAULT_PARAGRAPH_PAUSE.to_string(),
            closing: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub strip_markdown: bool,
    /// "$5" 念成 "5 dollars"
    pub currency: bool,
    pub scrub: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            strip_markdown: true,
            currency: true,
            scrub: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    /// 未設定則不截斷
    pub max_total_chars: Option<usize>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHUNK_CHARS,
            max_total_chars: None,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!("📁 Loaded rule config from {}", path.as_ref().display());
        Ok(config)
    }

    /// 從 TOML 字串解析配置；`extends_builtin = true` 時接在內建規則之後
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);
        let config: Self = toml::from_str(&processed_content)?;

        if config.extends_builtin {
            return Ok(Self::builtin()?.merged_with(config));
        }
        Ok(config)
    }

    /// 內建配置
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_RULES_TOML)
    }

    /// 替換環境變數 (例如 ${SPEAKER_NAME})；未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        RE_ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 將 `other` 的規則接在本配置之後；其餘區段以 `other` 為準
    fn merged_with(self, other: TomlConfig) -> Self {
        let mut entries = self.rules.entries;
        entries.extend(other.rules.entries);
        let mut extra_rules = self.lecture.extra_rules;
        extra_rules.extend(other.lecture.extra_rules);

        Self {
            extends_builtin: false,
            rules: RulesConfig {
                order: other.rules.order,
                entries,
            },
            lecture: LectureConfig {
                extra_rules,
                ..other.lecture
            },
            cleanup: other.cleanup,
            chunking: other.chunking,
        }
    }

    pub fn chat_rules(&self) -> Vec<Rule> {
        self.rules.entries.iter().cloned().map(Rule::from).collect()
    }

    pub fn lecture_extra_rules(&self) -> Vec<Rule> {
        self.lecture
            .extra_rules
            .iter()
            .cloned()
            .map(Rule::from)
            .collect()
    }

    pub fn chat_table(&self) -> Result<RuleTable> {
        RuleTable::new(self.chat_rules(), self.rules.order)
    }

    /// 講課規則表 = 聊天規則 + 講課額外規則
    pub fn lecture_table(&self) -> Result<RuleTable> {
        let mut rules = self.chat_rules();
        rules.extend(self.lecture_extra_rules());
        RuleTable::new(rules, self.rules.order)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        for rule in self.chat_rules().iter().chain(self.lecture_extra_rules().iter()) {
            validate_rule_pattern(&rule.pattern)?;
        }

        validate_range("chunking.max_chars", self.chunking.max_chars, 16, 100_000)?;

        if let Some(max_total) = self.chunking.max_total_chars {
            validate_range("chunking.max_total_chars", max_total, 16, 10_000_000)?;
        }

        for (field, value) in [
            ("lecture.sentence_pause", &self.lecture.sentence_pause),
            ("lecture.paragraph_pause", &self.lecture.paragraph_pause),
        ] {
            validate_non_empty_string(field, value)?;
            if value.contains('\n') {
                return Err(NormalizerError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: value.clone(),
                    reason: "Pause text cannot contain line breaks".to_string(),
                });
            }
        }

        // 規則必須可編譯且無重複
        self.lecture_table()?;

        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_config_parses_and_validates() {
        let config = TomlConfig::builtin().unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.rules.order, RuleOrder::Specificity);
        assert_eq!(config.chunking.max_chars, 2500);
        assert!(config.chunking.max_total_chars.is_none());
        assert!(config.chat_rules().contains(&Rule::new("AI", "Artificial Intelligence")));
        assert!(config
            .lecture_extra_rules()
            .contains(&Rule::new("Dr.", "Doctor").case_sensitive()));
    }

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let toml_content = r#"
[rules]
entries = [["k8s", "Kubernetes"]]
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert!(!config.extends_builtin);
        assert_eq!(config.chat_rules(), vec![Rule::new("k8s", "Kubernetes")]);
        assert!(config.cleanup.strip_markdown);
        assert_eq!(config.lecture.sentence_pause, " ... ");
        assert_eq!(config.chunking.max_chars, 2500);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TTS_NORMALIZER_TEST_CLOSING", "See you next class");

        let toml_content = r#"
[lecture]
closing = "${TTS_NORMALIZER_TEST_CLOSING}"
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.lecture.closing.as_deref(), Some("See you next class"));
    }

    #[test]
    fn test_undefined_env_var_kept() {
        let toml_content = r#"
[lecture]
closing = "${TTS_NORMALIZER_TEST_UNDEFINED_VAR}"
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.lecture.closing.as_deref(),
            Some("${TTS_NORMALIZER_TEST_UNDEFINED_VAR}")
        );
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let result = TomlConfig::from_toml_str("[rules\nentries = ");
        assert!(matches!(result, Err(NormalizerError::TomlError(_))));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = TomlConfig::builtin().unwrap();
        config.chunking.max_chars = 4;
        assert!(matches!(
            config.validate(),
            Err(NormalizerError::InvalidConfigValueError { .. })
        ));

        let mut config = TomlConfig::builtin().unwrap();
        config.lecture.paragraph_pause = "\n\n".to_string();
        assert!(config.validate().is_err());

        // 空白停頓會讓句子直接黏在一起
        let mut config = TomlConfig::builtin().unwrap();
        config.lecture.sentence_pause = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(NormalizerError::InvalidConfigValueError { field, .. }) if field == "lecture.sentence_pause"
        ));

        let config = TomlConfig::from_toml_str(
            r#"
[rules]
entries = [["AI", "Artificial Intelligence"], ["ai", "Artificial Intelligence"]]
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(NormalizerError::RuleError { .. })
        ));
    }

    #[test]
    fn test_from_file_extends_builtin() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
extends_builtin = true

[rules]
entries = [["k8s", "Kubernetes"]]

[chunking]
max_chars = 500
"#
        )
        .unwrap();

        let config = TomlConfig::from_file(file.path()).unwrap();
        let rules = config.chat_rules();
        assert!(rules.contains(&Rule::new("AI", "Artificial Intelligence")));
        assert!(rules.contains(&Rule::new("k8s", "Kubernetes")));
        assert!(!config.lecture.extra_rules.is_empty());
        assert_eq!(config.chunking.max_chars, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_str_extends_builtin() {
        let config = TomlConfig::from_toml_str(
            r#"
extends_builtin = true

[rules]
entries = [["LLM", "Large Language Model"]]
"#,
        )
        .unwrap();

        assert!(!config.extends_builtin);
        let rules = config.chat_rules();
        assert!(rules.contains(&Rule::new("AI", "Artificial Intelligence")));
        assert_eq!(rules.last(), Some(&Rule::new("LLM", "Large Language Model")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = TomlConfig::from_file("/nonexistent/tts-rules.toml");
        assert!(matches!(result, Err(NormalizerError::IoError(_))));
    }
}
