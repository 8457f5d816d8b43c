//! 語音合成前後的清理步驟
//!
//! - `strip_markdown`：正規化之前移除 LLM 輸出中的 markdown 標記，保留段落換行
//! - `read_currency_amounts`：正規化之前把 "$5" 改寫成 "5 dollars"，金額先念
//! - `scrub_for_speech`：正規化之後移除 TTS 會照字面念出的字元並整理空白

use crate::domain::ports::TextStage;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RE_CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*```[^\n]*$").unwrap());
static RE_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").unwrap());
static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-*+][ \t]+").unwrap());
static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").unwrap());
static RE_MARKDOWN_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap());
static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*").unwrap());
static RE_UNDERSCORE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"__([^_\n]+?)__").unwrap());
static RE_ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\n]+?)\*").unwrap());
static RE_UNDERSCORE_ITALIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^\w])_([^_\n]+?)_([^\w]|$)").unwrap());
static RE_INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").unwrap());

static RE_DOLLAR_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$[ \t]?(\d+(?:,\d{3})*(?:\.\d+)?)").unwrap());

static RE_MARKUP_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*#_`\[\]{}\\|<>~^]").unwrap());
static RE_ELLIPSIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2,}|…").unwrap());
static RE_DASH_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}|[—–]").unwrap());
static RE_UNSPEAKABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s.,!?;:'\-]").unwrap());
static RE_REPEATED_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([.,!?;:])[ \t]*[.,!?;:]+").unwrap());
static RE_SPACE_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+([,.;:!?])").unwrap());
static RE_HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{00A0}]+").unwrap());
static RE_LINE_EDGES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]*\n[ \t]*").unwrap());
static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// 移除 markdown 標記，保留文字內容與換行
pub fn strip_markdown(text: &str) -> String {
    let text = RE_CODE_FENCE.replace_all(text, "");
    let text = RE_HEADER.replace_all(&text, "");
    let text = RE_BULLET.replace_all(&text, "");
    let text = RE_IMAGE.replace_all(&text, "$1");
    let text = RE_MARKDOWN_LINK.replace_all(&text, "$1");
    let text = RE_BOLD.replace_all(&text, "$1");
    let text = RE_UNDERSCORE_BOLD.replace_all(&text, "$1");
    let text = RE_ITALIC.replace_all(&text, "$1");
    let text = RE_UNDERSCORE_ITALIC.replace_all(&text, "${1}${2}${3}");
    let text = RE_INLINE_CODE.replace_all(&text, "$1");
    text.into_owned()
}

/// 金額改寫為「數字 + dollars」，單獨的 "$" 留給規則表處理
pub fn read_currency_amounts(text: &str) -> String {
    RE_DOLLAR_AMOUNT
        .replace_all(text, |caps: &Captures| {
            let amount = &caps[1];
            let unit = if amount == "1" { "dollar" } else { "dollars" };
            format!("{} {}", amount, unit)
        })
        .into_owned()
}

/// 清除 TTS 會照念的字元，折疊標點與空白；段落換行保留為單一空行
pub fn scrub_for_speech(text: &str) -> String {
    let text = RE_MARKUP_CHARS.replace_all(text, " ");
    let text = RE_ELLIPSIS.replace_all(&text, ".");
    let text = RE_DASH_RUN.replace_all(&text, ", ");
    let text = RE_UNSPEAKABLE.replace_all(&text, " ");
    let text = RE_SPACE_BEFORE_PUNCT.replace_all(&text, "$1");
    let text = RE_REPEATED_PUNCT.replace_all(&text, "$1");
    let text = RE_HORIZONTAL_WS.replace_all(&text, " ");
    let text = RE_LINE_EDGES.replace_all(&text, "\n");
    let text = RE_BLANK_LINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownStripper;

impl TextStage for MarkdownStripper {
    fn name(&self) -> &'static str {
        "strip_markdown"
    }

    fn apply(&self, text: &str) -> String {
        strip_markdown(text)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CurrencyReader;

impl TextStage for CurrencyReader {
    fn name(&self) -> &'static str {
        "currency"
    }

    fn apply(&self, text: &str) -> String {
        read_currency_amounts(text)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpeechScrubber;

impl TextStage for SpeechScrubber {
    fn name(&self) -> &'static str {
        "scrub"
    }

    fn apply(&self, text: &str) -> String {
        scrub_for_speech(text)
    }
}
