use crate::config::toml_config::TomlConfig;
use crate::core::chunker::{truncate_at_sentence, Chunker};
use crate::core::cleanup::{CurrencyReader, MarkdownStripper, SpeechScrubber};
use crate::core::lecture::LectureFormatter;
use crate::core::normalizer::Normalizer;
use crate::domain::model::{NormalizationReport, ResponsePath, SpeechOutput};
use crate::domain::ports::TextStage;
use crate::utils::error::Result;

/// 語音輸出管線：依回應路徑組合各處理階段。
///
/// 順序：markdown 移除 → 金額改寫 → 規則正規化 → 語音清理 → 講課格式（僅 lecture）→ 截斷 → 分段
#[derive(Debug, Clone)]
pub struct SpeechPipeline {
    chat: Normalizer,
    lecture: Normalizer,
    markdown: Option<MarkdownStripper>,
    currency: Option<CurrencyReader>,
    scrubber: Option<SpeechScrubber>,
    formatter: LectureFormatter,
    chunker: Chunker,
    max_total_chars: Option<usize>,
}

impl SpeechPipeline {
    pub fn from_config(config: &TomlConfig) -> Result<Self> {
        let chat = Normalizer::new(config.chat_table()?);
        let lecture = Normalizer::new(config.lecture_table()?);

        tracing::info!(
            "📚 Loaded rule tables: chat={} rules, lecture={} rules",
            chat.table().len(),
            lecture.table().len()
        );

        Ok(Self {
            chat,
            lecture,
            markdown: config.cleanup.strip_markdown.then_some(MarkdownStripper),
            currency: config.cleanup.currency.then_some(CurrencyReader),
            scrubber: config.cleanup.scrub.then_some(SpeechScrubber),
            formatter: LectureFormatter::new(
                config.lecture.sentence_pause.clone(),
                config.lecture.paragraph_pause.clone(),
                config.lecture.closing.clone(),
            ),
            chunker: Chunker::new(config.chunking.max_chars),
            max_total_chars: config.chunking.max_total_chars,
        })
    }

    /// 以內建設定建立（共用已編譯的內建規則表）
    pub fn builtin() -> Self {
        Self {
            chat: Normalizer::builtin().clone(),
            lecture: Normalizer::builtin_lecture().clone(),
            markdown: Some(MarkdownStripper),
            currency: Some(CurrencyReader),
            scrubber: Some(SpeechScrubber),
            formatter: LectureFormatter::default(),
            chunker: Chunker::default(),
            max_total_chars: None,
        }
    }

    pub fn normalizer(&self, path: ResponsePath) -> &Normalizer {
        match path {
            ResponsePath::Chat => &self.chat,
            ResponsePath::Lecture => &self.lecture,
        }
    }

    /// 只做規則正規化
    pub fn normalize(&self, text: &str, path: ResponsePath) -> String {
        self.normalizer(path).normalize(text)
    }

    /// 正規化之前的階段
    fn leading_stages(&self) -> Vec<&dyn TextStage> {
        let mut stages: Vec<&dyn TextStage> = Vec::with_capacity(2);
        if let Some(markdown) = &self.markdown {
            stages.push(markdown);
        }
        if let Some(currency) = &self.currency {
            stages.push(currency);
        }
        stages
    }

    /// 正規化之後的階段
    fn trailing_stages(&self, path: ResponsePath) -> Vec<&dyn TextStage> {
        let mut stages: Vec<&dyn TextStage> = Vec::with_capacity(2);
        if let Some(scrubber) = &self.scrubber {
            stages.push(scrubber);
        }
        if path == ResponsePath::Lecture {
            stages.push(&self.formatter);
        }
        stages
    }

    /// 完整處理：產生交給 TTS 的文字與分段。不會失敗
    pub fn prepare(&self, text: &str, path: ResponsePath) -> SpeechOutput {
        self.prepare_with_report(text, path).0
    }

    /// 與 `prepare` 相同，另外回傳正規化階段實際命中的規則
    pub fn prepare_with_report(
        &self,
        text: &str,
        path: ResponsePath,
    ) -> (SpeechOutput, NormalizationReport) {
        let mut current = text.to_string();
        for stage in self.leading_stages() {
            current = run_stage(stage, &current);
        }

        let report = self.normalizer(path).normalize_with_report(&current);
        current = report.text.clone();
        tracing::debug!(
            "Stage 'normalize' -> {} chars, {} replacement(s)",
            current.len(),
            report.total_replacements()
        );

        for stage in self.trailing_stages(path) {
            current = run_stage(stage, &current);
        }

        if let Some(max_total) = self.max_total_chars {
            if current.chars().count() > max_total {
                tracing::info!("✂️ Truncating {} path output to {} chars", path, max_total);
                current = truncate_at_sentence(&current, max_total);
            }
        }

        let chunks = self.chunker.split(&current);

        let output = SpeechOutput {
            path,
            text: current,
            chunks,
        };
        (output, report)
    }
}

fn run_stage(stage: &dyn TextStage, text: &str) -> String {
    let out = stage.apply(text);
    tracing::debug!("Stage '{}' -> {} chars", stage.name(), out.len());
    out
}
