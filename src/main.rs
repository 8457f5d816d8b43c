use clap::Parser;
use serde::Serialize;
use std::io::Read;
use tts_normalizer::domain::model::{NormalizationReport, SpeechOutput};
use tts_normalizer::utils::{logger, validation::Validate};
use tts_normalizer::{CliConfig, NormalizerError, SpeechPipeline};

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    output: &'a SpeechOutput,
    rules: &'a NormalizationReport,
}

fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting tts-normalize ({} path)", config.path);
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.severity().exit_code());
    }

    if let Err(e) = run(&config) {
        tracing::error!(
            "❌ Normalization failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = e.severity().exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

fn run(config: &CliConfig) -> Result<(), NormalizerError> {
    let settings = config.load_settings()?;
    let pipeline = SpeechPipeline::from_config(&settings)?;
    let text = read_input(config)?;

    tracing::debug!("Read {} chars of input", text.len());

    if config.normalize_only {
        let report = pipeline.normalizer(config.path).normalize_with_report(&text);
        explain(config, &report);
        if config.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", report.text);
        }
        return Ok(());
    }

    let (output, report) = pipeline.prepare_with_report(&text, config.path);
    explain(config, &report);
    tracing::info!(
        "✅ Prepared {} chars in {} chunk(s)",
        output.text.chars().count(),
        output.chunks.len()
    );

    if config.json {
        let json = JsonReport {
            output: &output,
            rules: &report,
        };
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else if config.chunks {
        for chunk in &output.chunks {
            println!("{}", chunk);
        }
    } else {
        println!("{}", output.text);
    }

    Ok(())
}

fn explain(config: &CliConfig, report: &NormalizationReport) {
    if !config.explain {
        return;
    }
    for hit in &report.hits {
        eprintln!("  {} -> {} (x{})", hit.pattern, hit.replacement, hit.count);
    }
    eprintln!("  {} replacement(s) in total", report.total_replacements());
}

fn read_input(config: &CliConfig) -> Result<String, NormalizerError> {
    match &config.input {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}
