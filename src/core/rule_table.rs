use crate::domain::model::{Rule, RuleKind, RuleOrder};
use crate::utils::error::{NormalizerError, Result};
use crate::utils::validation::validate_rule_pattern;
use regex::{NoExpand, Regex, RegexBuilder};
use std::borrow::Cow;
use std::cmp::Reverse;
use std::collections::HashSet;

/// 已編譯的規則
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: Rule,
    kind: RuleKind,
    regex: Regex,
}

impl CompiledRule {
    pub fn compile(rule: Rule) -> Result<Self> {
        validate_rule_pattern(&rule.pattern)?;

        let kind = rule.kind();
        let escaped = regex::escape(&rule.pattern);
        // 詞彙規則用半邊界：前一個與後一個字元都不可是文字字元。
        // 與 \b 不同，樣式以 "." 結尾時仍能整段比對（"e.g."）。
        let source = match kind {
            RuleKind::Word => format!(r"\b{{start-half}}{}\b{{end-half}}", escaped),
            RuleKind::Symbol => escaped,
        };

        let regex = RegexBuilder::new(&source)
            .case_insensitive(!rule.case_sensitive)
            .build()
            .map_err(|e| NormalizerError::RuleError {
                pattern: rule.pattern.clone(),
                message: e.to_string(),
            })?;

        Ok(Self { rule, kind, regex })
    }

    pub fn pattern(&self) -> &str {
        &self.rule.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.rule.replacement
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// 套用本規則，回傳新文字與命中次數。未命中時不配置記憶體
    pub fn apply<'t>(&self, text: &'t str) -> (Cow<'t, str>, usize) {
        match self.kind {
            RuleKind::Word => {
                let hits = self.regex.find_iter(text).count();
                if hits == 0 {
                    return (Cow::Borrowed(text), 0);
                }
                let replaced = self
                    .regex
                    .replace_all(text, NoExpand(&self.rule.replacement));
                (Cow::Owned(replaced.into_owned()), hits)
            }
            RuleKind::Symbol => self.apply_symbol(text),
        }
    }

    fn apply_symbol<'t>(&self, text: &'t str) -> (Cow<'t, str>, usize) {
        let spoken = self.rule.replacement.trim();
        let mut out = String::with_capacity(text.len() + spoken.len() * 2);
        let mut last_end = 0;
        let mut hits = 0;

        for m in self.regex.find_iter(text) {
            out.push_str(&text[last_end..m.start()]);

            if !spoken.is_empty() {
                if out.chars().next_back().is_some_and(needs_gap_before) {
                    out.push(' ');
                }
                out.push_str(spoken);
                if text[m.end()..].chars().next().is_some_and(needs_gap_after) {
                    out.push(' ');
                }
            }

            last_end = m.end();
            hits += 1;
        }

        if hits == 0 {
            return (Cow::Borrowed(text), 0);
        }

        out.push_str(&text[last_end..]);
        (Cow::Owned(out), hits)
    }
}

fn needs_gap_before(prev: char) -> bool {
    !prev.is_whitespace() && !matches!(prev, '(' | '[' | '{' | '"' | '\'')
}

fn needs_gap_after(next: char) -> bool {
    !next.is_whitespace()
        && !matches!(
            next,
            ')' | ']' | '}' | '"' | '\'' | '.' | ',' | ';' | ':' | '!' | '?'
        )
}

/// 有序、不可變的規則表
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<CompiledRule>,
    order: RuleOrder,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>, order: RuleOrder) -> Result<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(dedup_key(rule)) {
                return Err(NormalizerError::RuleError {
                    pattern: rule.pattern.clone(),
                    message: "duplicate pattern in rule table".to_string(),
                });
            }
        }

        let mut rules = rules;
        if order == RuleOrder::Specificity {
            rules.sort_by_key(|rule| Reverse(rule.pattern.chars().count()));
        }

        let rules = rules
            .into_iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Compiled rule table with {} rules ({} order)", rules.len(), order);

        Ok(Self { rules, order })
    }

    /// 內建聊天規則表
    pub fn builtin() -> &'static RuleTable {
        crate::core::normalizer::Normalizer::builtin().table()
    }

    pub fn order(&self) -> RuleOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter()
    }

}

fn dedup_key(rule: &Rule) -> (bool, String) {
    if rule.case_sensitive {
        (true, rule.pattern.clone())
    } else {
        (false, rule.pattern.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(pattern: &str, replacement: &str) -> CompiledRule {
        CompiledRule::compile(Rule::new(pattern, replacement)).unwrap()
    }

    #[test]
    fn test_word_rule_respects_boundaries() {
        let rule = compile("AI", "Artificial Intelligence");
        assert_eq!(rule.apply("AI is here").0, "Artificial Intelligence is here");
        assert_eq!(rule.apply("CHAIN").1, 0);
        assert_eq!(rule.apply("AIM").1, 0);
        assert_eq!(rule.apply("MAI").1, 0);
        assert_eq!(rule.apply("ai").0, "Artificial Intelligence");
    }

    #[test]
    fn test_dotted_rule_consumes_final_dot() {
        let rule = compile("e.g.", "for example");
        let (out, hits) = rule.apply("e.g. apples, E.G. pears");
        assert_eq!(out, "for example apples, for example pears");
        assert_eq!(hits, 2);
        // 後接文字字元時不比對
        assert_eq!(rule.apply("e.g.x").1, 0);
    }

    #[test]
    fn test_case_sensitive_rule() {
        let rule = CompiledRule::compile(Rule::new("Ms.", "Miss").case_sensitive()).unwrap();
        assert_eq!(rule.apply("Ms. Rao").0, "Miss Rao");
        assert_eq!(rule.apply("200 ms.").1, 0);
    }

    #[test]
    fn test_symbol_rule_spacing() {
        let rule = compile("%", "percent");
        assert_eq!(rule.apply("50% done").0, "50 percent done");
        assert_eq!(rule.apply("50 % done").0, "50 percent done");
        assert_eq!(rule.apply("grew 50%.").0, "grew 50 percent.");
        assert_eq!(rule.apply("(%)").0, "(percent)");

        let rule = compile("&", "and");
        assert_eq!(rule.apply("R&D").0, "R and D");
        assert_eq!(rule.apply("&&").0, "and and");
        assert_eq!(rule.apply("&").0, "and");
    }

    #[test]
    fn test_replacement_is_not_expanded() {
        let rule = compile("USD", "$1 dollars");
        assert_eq!(rule.apply("USD").0, "$1 dollars");
    }

    #[test]
    fn test_unmatched_text_is_borrowed() {
        let rule = compile("AI", "Artificial Intelligence");
        assert!(matches!(rule.apply("nothing here").0, Cow::Borrowed(_)));
    }

    #[test]
    fn test_specificity_order_is_stable() {
        let table = RuleTable::new(
            vec![
                Rule::new("AI", "Artificial Intelligence"),
                Rule::new("A.I.", "Artificial Intelligence"),
                Rule::new("ML", "Machine Learning"),
                Rule::new("A.I", "Artificial Intelligence"),
            ],
            RuleOrder::Specificity,
        )
        .unwrap();

        let patterns: Vec<&str> = table.rules().map(|r| r.pattern()).collect();
        assert_eq!(patterns, vec!["A.I.", "A.I", "AI", "ML"]);
    }

    #[test]
    fn test_configured_order_is_kept() {
        let table = RuleTable::new(
            vec![Rule::new("g.", "gram"), Rule::new("e.g.", "for example")],
            RuleOrder::Configured,
        )
        .unwrap();

        let patterns: Vec<&str> = table.rules().map(|r| r.pattern()).collect();
        assert_eq!(patterns, vec!["g.", "e.g."]);
    }

    #[test]
    fn test_duplicate_and_empty_patterns_rejected() {
        let dup = RuleTable::new(
            vec![Rule::new("AI", "a"), Rule::new("ai", "b")],
            RuleOrder::Configured,
        );
        assert!(matches!(dup, Err(NormalizerError::RuleError { .. })));

        // 大小寫敏感規則與不敏感規則視為不同鍵
        let mixed = RuleTable::new(
            vec![Rule::new("US", "United States").case_sensitive(), Rule::new("us", "us")],
            RuleOrder::Configured,
        );
        assert!(mixed.is_ok());

        let empty = RuleTable::new(vec![Rule::new("", "x")], RuleOrder::Configured);
        assert!(empty.is_err());
    }

    #[test]
    fn test_builtin_table_is_shared() {
        let table = RuleTable::builtin();
        assert!(!table.is_empty());
        assert_eq!(table.order(), RuleOrder::Specificity);
        assert!(std::ptr::eq(table, RuleTable::builtin()));
        assert!(table.rules().any(|r| r.pattern() == "A.I."));
    }
}
