use crate::domain::ports::TextStage;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RE_PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n\s*").unwrap());
static RE_SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"([.!?])\s+").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub const DEFAULT_SENTENCE_PAUSE: &str = " ... ";
pub const DEFAULT_PARAGRAPH_PAUSE: &str = " ... ... ";

/// 講課語氣格式化：句間與段間插入停頓、補句尾標點、可選結語
#[derive(Debug, Clone)]
pub struct LectureFormatter {
    sentence_pause: String,
    paragraph_pause: String,
    closing: Option<String>,
}

impl Default for LectureFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_SENTENCE_PAUSE, DEFAULT_PARAGRAPH_PAUSE, None)
    }
}

impl LectureFormatter {
    pub fn new(
        sentence_pause: impl Into<String>,
        paragraph_pause: impl Into<String>,
        closing: Option<String>,
    ) -> Self {
        let closing = closing
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Self {
            sentence_pause: sentence_pause.into(),
            paragraph_pause: paragraph_pause.into(),
            closing,
        }
    }

    pub fn format(&self, text: &str) -> String {
        let paragraphs: Vec<String> = RE_PARAGRAPH_BREAK
            .split(text.trim())
            .map(|p| RE_WHITESPACE.replace_all(p.trim(), " "))
            .filter(|p| !p.is_empty())
            .map(|p| self.pause_sentences(&p))
            .collect();

        if paragraphs.is_empty() {
            return String::new();
        }

        let mut out = String::new();
        for (i, paragraph) in paragraphs.iter().enumerate() {
            if i > 0 {
                out.push_str(&self.paragraph_pause);
            }
            out.push_str(paragraph);
            terminate_sentence(&mut out);
        }

        if let Some(closing) = &self.closing {
            out.push_str(&self.sentence_pause);
            out.push_str(closing);
            terminate_sentence(&mut out);
        }

        out
    }

    fn pause_sentences(&self, paragraph: &str) -> String {
        RE_SENTENCE_END
            .replace_all(paragraph, |caps: &Captures| {
                format!("{}{}", &caps[1], self.sentence_pause)
            })
            .into_owned()
    }
}

fn terminate_sentence(out: &mut String) {
    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    if !out.ends_with(['.', '!', '?']) {
        out.push('.');
    }
}

impl TextStage for LectureFormatter {
    fn name(&self) -> &'static str {
        "lecture"
    }

    fn apply(&self, text: &str) -> String {
        self.format(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_and_paragraph_pauses() {
        let formatter = LectureFormatter::default();
        let out = formatter.format("Welcome to class. Today we learn graphs!\n\nFirst, nodes");
        assert_eq!(
            out,
            "Welcome to class. ... Today we learn graphs! ... ... First, nodes."
        );
    }

    #[test]
    fn test_closing_line() {
        let formatter = LectureFormatter::new(" ... ", " ... ... ", Some("Questions are welcome".into()));
        assert_eq!(
            formatter.format("That is all?"),
            "That is all? ... Questions are welcome."
        );
    }

    #[test]
    fn test_blank_closing_is_ignored() {
        let formatter = LectureFormatter::new(" ... ", " ... ... ", Some("   ".into()));
        assert_eq!(formatter.format("Done"), "Done.");
    }

    #[test]
    fn test_empty_input() {
        let formatter = LectureFormatter::default();
        assert_eq!(formatter.format(""), "");
        assert_eq!(formatter.format(" \n\n "), "");
    }

    #[test]
    fn test_decimals_are_not_sentence_ends() {
        let formatter = LectureFormatter::default();
        assert_eq!(formatter.format("Pi is 3.14 roughly"), "Pi is 3.14 roughly.");
    }
}
