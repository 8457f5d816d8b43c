use crate::config::toml_config::TomlConfig;
use crate::core::rule_table::RuleTable;
use crate::domain::model::{NormalizationReport, RuleHit};
use crate::domain::ports::TextStage;
use once_cell::sync::Lazy;
use std::borrow::Cow;

static BUILTIN_CHAT: Lazy<Normalizer> = Lazy::new(|| {
    let table = TomlConfig::builtin()
        .and_then(|config| config.chat_table())
        .expect("embedded rules/default.toml must compile");
    Normalizer::new(table)
});

static BUILTIN_LECTURE: Lazy<Normalizer> = Lazy::new(|| {
    let table = TomlConfig::builtin()
        .and_then(|config| config.lecture_table())
        .expect("embedded rules/default.toml must compile");
    Normalizer::new(table)
});

/// 文字正規化器：依序套用規則表，將縮寫與符號改寫成口語形式。
///
/// 純函式、不可失敗；未命中的文字原樣保留。可跨執行緒共用。
#[derive(Debug, Clone)]
pub struct Normalizer {
    table: RuleTable,
}

impl Normalizer {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    /// 內建聊天規則表（程序內只編譯一次）
    pub fn builtin() -> &'static Normalizer {
        &BUILTIN_CHAT
    }

    /// 內建講課規則表：聊天規則加上稱謂與額外符號
    pub fn builtin_lecture() -> &'static Normalizer {
        &BUILTIN_LECTURE
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn normalize(&self, text: &str) -> String {
        let mut current: Cow<'_, str> = Cow::Borrowed(text);

        for rule in self.table.rules() {
            let (next, hits) = rule.apply(&current);
            if hits > 0 {
                tracing::debug!("Rule '{}' fired {} time(s)", rule.pattern(), hits);
                let owned = next.into_owned();
                current = Cow::Owned(owned);
            }
        }

        current.into_owned()
    }

    /// 與 `normalize` 相同，另外回傳每條規則的命中次數
    pub fn normalize_with_report(&self, text: &str) -> NormalizationReport {
        let mut current = text.to_string();
        let mut hits = Vec::new();

        for rule in self.table.rules() {
            let (next, count) = rule.apply(&current);
            if count > 0 {
                let owned = next.into_owned();
                current = owned;
                hits.push(RuleHit {
                    pattern: rule.pattern().to_string(),
                    replacement: rule.replacement().to_string(),
                    count,
                });
            }
        }

        NormalizationReport {
            changed: current != text,
            text: current,
            hits,
        }
    }
}

impl TextStage for Normalizer {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn apply(&self, text: &str) -> String {
        self.normalize(text)
    }
}
