use crate::core::rule_table::RuleTable;
use crate::domain::model::Rule;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// 規則表靜態檢查發現的問題
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleConflict {
    /// 前面的規則會先吃掉後面規則的樣式
    Shadowed { earlier: String, later: String },
    /// 某規則的展開文字會再被另一條規則比對（二次正規化不穩定）
    IdempotenceHazard {
        producer: String,
        replacement: String,
        matched_by: String,
    },
    /// 重複樣式（僅原始規則清單可能出現）
    Duplicate { pattern: String },
}

impl fmt::Display for RuleConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleConflict::Shadowed { earlier, later } => write!(
                f,
                "rule '{}' runs before '{}' and matches inside its pattern",
                earlier, later
            ),
            RuleConflict::IdempotenceHazard {
                producer,
                replacement,
                matched_by,
            } => write!(
                f,
                "expansion '{}' of rule '{}' is matched again by rule '{}'",
                replacement, producer, matched_by
            ),
            RuleConflict::Duplicate { pattern } => {
                write!(f, "pattern '{}' appears more than once", pattern)
            }
        }
    }
}

/// 檢查已編譯規則表的遮蔽與冪等性問題
pub fn audit(table: &RuleTable) -> Vec<RuleConflict> {
    let rules: Vec<_> = table.rules().collect();
    let mut conflicts = Vec::new();

    for (i, earlier) in rules.iter().enumerate() {
        for later in &rules[i + 1..] {
            if earlier.is_match(later.pattern()) {
                conflicts.push(RuleConflict::Shadowed {
                    earlier: earlier.pattern().to_string(),
                    later: later.pattern().to_string(),
                });
            }
        }
    }

    for producer in &rules {
        for matcher in &rules {
            if matcher.is_match(producer.replacement()) {
                conflicts.push(RuleConflict::IdempotenceHazard {
                    producer: producer.pattern().to_string(),
                    replacement: producer.replacement().to_string(),
                    matched_by: matcher.pattern().to_string(),
                });
            }
        }
    }

    for conflict in &conflicts {
        tracing::warn!("⚠️ Rule table conflict: {}", conflict);
    }

    conflicts
}

/// 編譯前檢查原始規則清單的重複樣式
pub fn audit_rules(rules: &[Rule]) -> Vec<RuleConflict> {
    let mut counts: HashMap<(bool, String), (usize, &str)> = HashMap::new();
    for rule in rules {
        let key = if rule.case_sensitive {
            (true, rule.pattern.clone())
        } else {
            (false, rule.pattern.to_lowercase())
        };
        counts.entry(key).or_insert((0, rule.pattern.as_str())).0 += 1;
    }

    let mut duplicates: Vec<RuleConflict> = counts
        .into_values()
        .filter(|(count, _)| *count > 1)
        .map(|(_, pattern)| RuleConflict::Duplicate {
            pattern: pattern.to_string(),
        })
        .collect();
    duplicates.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
    duplicates
}
