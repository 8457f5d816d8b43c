use clap::Parser;
use tts_normalizer::core::audit::{audit, audit_rules};
use tts_normalizer::utils::{logger, validation::Validate};
use tts_normalizer::{RuleTable, TomlConfig};

#[derive(Parser)]
#[command(name = "rule-audit")]
#[command(about = "Check a pronunciation rule table for shadowed rules and unstable expansions")]
struct Args {
    /// Path to TOML rule config (built-in table when omitted)
    #[arg(short, long)]
    config: Option<String>,

    /// Also list every rule in application order
    #[arg(long)]
    list: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    let source = args.config.as_deref().unwrap_or("<built-in>");
    tracing::info!("📁 Auditing rule config: {}", source);

    // 載入 TOML 配置
    let config = match &args.config {
        Some(path) => TomlConfig::from_file(path),
        None => TomlConfig::builtin(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load rule config '{}': {}", source, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 重複樣式在編譯階段就會失敗，先以原始清單回報
    let mut raw_rules = config.chat_rules();
    raw_rules.extend(config.lecture_extra_rules());
    let duplicates = audit_rules(&raw_rules);
    if !duplicates.is_empty() {
        println!("❌ Duplicate patterns:");
        for conflict in &duplicates {
            println!("  {}", conflict);
        }
        std::process::exit(1);
    }

    if let Err(e) = config.validate() {
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let chat = config.chat_table()?;
    let lecture = config.lecture_table()?;

    let mut total_conflicts = 0;
    for (name, table) in [("chat", &chat), ("lecture", &lecture)] {
        display_table_summary(name, table, args.list);

        let conflicts = audit(table);
        if conflicts.is_empty() {
            println!("  ✅ No conflicts");
        } else {
            for conflict in &conflicts {
                println!("  ⚠️ {}", conflict);
            }
        }
        total_conflicts += conflicts.len();
        println!();
    }

    if total_conflicts > 0 {
        println!("❌ {} conflict(s) found", total_conflicts);
        std::process::exit(1);
    }

    println!("✅ Rule tables are clean");
    Ok(())
}

fn display_table_summary(name: &str, table: &RuleTable, list: bool) {
    println!("📋 {} table: {} rules ({} order)", name, table.len(), table.order());

    if list {
        for (index, rule) in table.rules().enumerate() {
            println!(
                "  {:>3}. {:?} {} -> {}",
                index + 1,
                rule.kind(),
                rule.pattern(),
                rule.replacement()
            );
        }
    }
}
