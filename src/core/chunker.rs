use once_cell::sync::Lazy;
use regex::Regex;

static RE_PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n\s*").unwrap());
static RE_SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+\s+").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub const DEFAULT_MAX_CHUNK_CHARS: usize = 2500;

/// 將長文字切成不超過 TTS 單次請求上限的片段。
///
/// 優先在段落切，其次句子，再其次單字；單一超長單字以字元邊界硬切。
/// 切出的單位再以空白貪婪合併。長度以字元計。
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_chars: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_CHARS)
    }
}

impl Chunker {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let mut units = Vec::new();
        for paragraph in RE_PARAGRAPH_BREAK.split(text) {
            let paragraph = RE_WHITESPACE.replace_all(paragraph.trim(), " ");
            if paragraph.is_empty() {
                continue;
            }
            self.push_units(&paragraph, &mut units);
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for unit in units {
            let unit_len = unit.chars().count();
            if current_len > 0 && current_len + 1 + unit_len > self.max_chars {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(&unit);
            current_len += unit_len;
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        tracing::debug!("Split {} chars into {} chunk(s)", text.len(), chunks.len());
        chunks
    }

    fn push_units(&self, paragraph: &str, units: &mut Vec<String>) {
        if paragraph.chars().count() <= self.max_chars {
            units.push(paragraph.to_string());
            return;
        }

        for sentence in split_sentences(paragraph) {
            if sentence.chars().count() <= self.max_chars {
                units.push(sentence.to_string());
                continue;
            }
            for word in sentence.split_whitespace() {
                if word.chars().count() <= self.max_chars {
                    units.push(word.to_string());
                } else {
                    units.extend(hard_split(word, self.max_chars));
                }
            }
        }
    }
}

/// 依句尾標點切句，標點保留在句子內
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in RE_SENTENCE_END.find_iter(text) {
        let sentence = text[start..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = m.end();
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

fn hard_split(word: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(max_chars)
        .map(|piece| piece.iter().collect())
        .collect()
}

/// 在句子邊界截斷到 `max_chars` 以內，結尾補句點。
///
/// 截斷點若落在前四分之三之前，改在單字邊界截斷。
pub fn truncate_at_sentence(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 1 {
        return ".".repeat(max_chars);
    }

    let budget = max_chars - 1;
    let cut_byte = text
        .char_indices()
        .nth(budget)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let prefix = &text[..cut_byte];

    if let Some(pos) = prefix.rfind(['.', '!', '?']) {
        let sentence_len = prefix[..=pos].chars().count();
        if sentence_len * 4 >= max_chars * 3 {
            return prefix[..=pos].to_string();
        }
    }

    let mut truncated = match prefix.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => prefix[..pos].trim_end().to_string(),
        _ => prefix.to_string(),
    };
    truncated = truncated
        .trim_end_matches([',', ';', ':', '-'])
        .to_string();
    truncated.push('.');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = Chunker::new(100);
        assert_eq!(chunker.split("Hello there.\nGeneral Kenobi."), vec!["Hello there. General Kenobi."]);
    }

    #[test]
    fn test_whitespace_only_has_no_chunks() {
        let chunker = Chunker::new(100);
        assert!(chunker.split("").is_empty());
        assert!(chunker.split("  \n\n \t").is_empty());
    }

    #[test]
    fn test_splits_on_sentences() {
        let chunker = Chunker::new(30);
        let chunks = chunker.split("One two three four. Five six seven eight. Nine ten.");
        assert_eq!(
            chunks,
            vec!["One two three four.", "Five six seven eight.", "Nine ten."]
        );
    }

    #[test]
    fn test_paragraphs_pack_together_when_they_fit() {
        let chunker = Chunker::new(40);
        let chunks = chunker.split("First part.\n\nSecond part.\n\nA third paragraph here.");
        assert_eq!(chunks, vec!["First part. Second part.", "A third paragraph here."]);
    }

    #[test]
    fn test_long_sentence_falls_back_to_words() {
        let chunker = Chunker::new(12);
        let chunks = chunker.split("alpha beta gamma delta epsilon");
        assert_eq!(chunks, vec!["alpha beta", "gamma delta", "epsilon"]);
    }

    #[test]
    fn test_long_word_hard_split_on_char_boundary() {
        let chunker = Chunker::new(4);
        let chunks = chunker.split("ééééééé");
        assert_eq!(chunks, vec!["éééé", "ééé"]);
    }

    #[test]
    fn test_chunks_never_exceed_limit() {
        let text = "Graph theory studies nodes and edges. ".repeat(40)
            + "\n\n"
            + &"Supercalifragilisticexpialidocious ".repeat(10);
        for max in [8, 25, 60, 200] {
            let chunker = Chunker::new(max);
            let chunks = chunker.split(&text);
            assert!(!chunks.is_empty());
            for chunk in &chunks {
                assert!(chunk.chars().count() <= max, "chunk over {}: {:?}", max, chunk);
                assert_eq!(chunk.trim(), chunk);
                assert!(!chunk.is_empty());
            }
        }
    }

    #[test]
    fn test_truncate_prefers_sentence_end() {
        let text = "This sentence is long enough. And the next one keeps going on";
        let out = truncate_at_sentence(text, 36);
        assert_eq!(out, "This sentence is long enough.");
    }

    #[test]
    fn test_truncate_falls_back_to_word_boundary() {
        let text = "Short. Then a very long clause without any stop at all";
        let out = truncate_at_sentence(text, 30);
        assert_eq!(out, "Short. Then a very long.");
        assert!(out.chars().count() <= 30);
    }

    #[test]
    fn test_truncate_noop_when_short() {
        assert_eq!(truncate_at_sentence("  Fits fine. ", 50), "Fits fine.");
    }
}
