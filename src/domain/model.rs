use serde::{Deserialize, Serialize};
use std::fmt;

/// 一條替換規則：樣式 → 口語展開
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub pattern: String,
    pub replacement: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl Rule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
            case_sensitive: false,
        }
    }

    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    /// 含任何字母或數字即為詞彙規則，否則為符號規則
    pub fn kind(&self) -> RuleKind {
        if self.pattern.chars().any(char::is_alphanumeric) {
            RuleKind::Word
        } else {
            RuleKind::Symbol
        }
    }
}

/// 設定檔中的規則條目：`["AI", "Artificial Intelligence"]` 或完整表格
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleEntry {
    Pair(String, String),
    Detailed(Rule),
}

impl From<RuleEntry> for Rule {
    fn from(entry: RuleEntry) -> Self {
        match entry {
            RuleEntry::Pair(pattern, replacement) => Rule::new(pattern, replacement),
            RuleEntry::Detailed(rule) => rule,
        }
    }
}

impl From<Rule> for RuleEntry {
    fn from(rule: Rule) -> Self {
        if rule.case_sensitive {
            RuleEntry::Detailed(rule)
        } else {
            RuleEntry::Pair(rule.pattern, rule.replacement)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleKind {
    /// 縮寫、字母縮略詞：兩側需為非文字字元
    Word,
    /// 符號：字面比對，展開後與相鄰文字以空白分隔
    Symbol,
}

/// 規則套用順序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleOrder {
    /// 依樣式長度由長到短（穩定排序）
    #[default]
    Specificity,
    /// 完全依設定檔順序
    Configured,
}

impl fmt::Display for RuleOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleOrder::Specificity => write!(f, "specificity"),
            RuleOrder::Configured => write!(f, "configured"),
        }
    }
}

/// 回應路徑：聊天回覆或課程講述
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ResponsePath {
    #[default]
    Chat,
    Lecture,
}

impl fmt::Display for ResponsePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponsePath::Chat => write!(f, "chat"),
            ResponsePath::Lecture => write!(f, "lecture"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleHit {
    pub pattern: String,
    pub replacement: String,
    pub count: usize,
}

/// 正規化結果與命中紀錄
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub text: String,
    pub changed: bool,
    pub hits: Vec<RuleHit>,
}

impl NormalizationReport {
    pub fn total_replacements(&self) -> usize {
        self.hits.iter().map(|h| h.count).sum()
    }
}

/// 交給 TTS 的最終文字與分段
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeechOutput {
    pub path: ResponsePath,
    pub text: String,
    pub chunks: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_kind() {
        assert_eq!(Rule::new("AI", "Artificial Intelligence").kind(), RuleKind::Word);
        assert_eq!(Rule::new("e.g.", "for example").kind(), RuleKind::Word);
        assert_eq!(Rule::new("%", "percent").kind(), RuleKind::Symbol);
        assert_eq!(Rule::new("&", "and").kind(), RuleKind::Symbol);
    }

    #[derive(Deserialize)]
    struct Entries {
        entries: Vec<RuleEntry>,
    }

    #[test]
    fn test_rule_entry_forms() {
        let parsed: Entries = toml::from_str(
            r#"
entries = [
  ["AI", "Artificial Intelligence"],
  { pattern = "Dr.", replacement = "Doctor", case_sensitive = true },
]
"#,
        )
        .unwrap();

        let rules: Vec<Rule> = parsed.entries.into_iter().map(Rule::from).collect();
        assert_eq!(rules[0], Rule::new("AI", "Artificial Intelligence"));
        assert_eq!(rules[1], Rule::new("Dr.", "Doctor").case_sensitive());
    }
}
