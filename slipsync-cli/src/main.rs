use anyhow::{Context, Result};
use clap::{Args, Parser};
use slipsync_core::time::parse_timezone;
use slipsync_core::{ErrorReporter, MemoStyle, ReviewPolicy};
use slipsync_enrich::Reconciler;
use slipsync_ingest::{NotificationSource, split_records};
use std::path::PathBuf;

mod config;
mod pocketsmith;
mod telemetry;

use config::Config;
use pocketsmith::PocketSmith;
use telemetry::SentryReporter;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SLIPSYNC_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(
    name = "slipsync",
    version = VERSION,
    about = "Enrich PocketSmith transactions with payees and references from bank transfer notifications"
)]
struct Cli {
    /// PocketSmith developer key
    #[arg(long, env = "POCKETSMITH_TOKEN", hide_env_values = true)]
    pocketsmith_token: String,

    /// PocketSmith transaction account the bank feed lands in
    #[arg(
        long,
        env = "POCKETSMITH_TRANSACTION_ACCOUNT",
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pocketsmith_transaction_account: i64,

    /// Notification file: local path or http(s) URL
    #[arg(long, env = "POCKETSMITH_META_FILE")]
    transaction_meta_file: String,

    /// Optional TOML policy file
    #[arg(long, env = "SLIPSYNC_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "POCKETSMITH_BASE_URL", default_value = pocketsmith::DEFAULT_BASE_URL, hide = true)]
    pocketsmith_base_url: String,

    #[command(flatten)]
    policy: PolicyArgs,
}

/// Overrides for values that can also come from the config file
#[derive(Args, Debug, Default)]
struct PolicyArgs {
    /// IANA time zone of notification timestamps (default: Asia/Bangkok)
    #[arg(long)]
    timezone: Option<String>,

    /// Original-payee phrase marking a transfer (repeatable, replaces the configured list)
    #[arg(long = "transfer-phrase")]
    transfer_phrases: Vec<String>,

    /// Match candidates regardless of their original payee
    #[arg(long)]
    any_payee: bool,

    /// Stop after this many consecutive already-enriched records (0 = never)
    #[arg(long)]
    skip_streak_limit: Option<usize>,

    /// Memo written on enriched transactions: reference or full
    #[arg(long)]
    memo_style: Option<MemoStyle>,

    /// Keep the transaction's needs-review flag instead of raising it
    #[arg(long)]
    preserve_review: bool,

    /// Do not re-categorize with the user's category rules
    #[arg(long)]
    no_category_rules: bool,

    /// Do not attach matching unassigned receipts
    #[arg(long)]
    no_attachments: bool,

    /// Abort the run on a notification with an unparseable date/time
    #[arg(long)]
    strict_timestamps: bool,
}

impl PolicyArgs {
    fn apply(&self, cfg: &mut Config) {
        if let Some(tz) = &self.timezone {
            cfg.timezone = tz.clone();
        }

        let m = &mut cfg.matching;
        if !self.transfer_phrases.is_empty() {
            m.transfer_phrases = self.transfer_phrases.clone();
        }
        if self.any_payee {
            m.require_transfer_phrase = false;
        }
        if let Some(limit) = self.skip_streak_limit {
            m.skip_streak_limit = limit;
        }
        if let Some(style) = self.memo_style {
            m.memo_style = style;
        }
        if self.preserve_review {
            m.review = ReviewPolicy::Preserve;
        }
        if self.no_category_rules {
            m.infer_categories = false;
        }
        if self.no_attachments {
            m.assign_attachments = false;
        }
        if self.strict_timestamps {
            m.strict_timestamps = true;
        }
    }
}

/// Used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "slipsync_cli=info,slipsync_enrich=info,slipsync_ingest=info";

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut cfg = config::load_config(cli.config.as_deref())?;
    cli.policy.apply(&mut cfg);
    let tz = parse_timezone(&cfg.timezone)?;

    let reporter = SentryReporter::from_env()?;
    let ledger = PocketSmith::new(&cli.pocketsmith_token, &cli.pocketsmith_base_url)
        .context("creating PocketSmith client")?;

    let source = NotificationSource::from_location(&cli.transaction_meta_file);
    let content = match source.read().await {
        Ok(c) => c,
        Err(e) => {
            if let Some(r) = &reporter {
                r.capture("loading notifications", &e).await;
            }
            return Err(e.context("loading notifications"));
        }
    };
    let lines = split_records(&content);

    let reconciler = Reconciler::new(ledger, cli.pocketsmith_transaction_account, tz, cfg.matching)
        .with_reporter(reporter);
    let summary = reconciler.run(&lines).await?;

    println!(
        "Done. Processed {} records, {} new",
        summary.total_records, summary.updated
    );
    if summary.stopped_early {
        println!("(stopped early: older records were already enriched)");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const REQUIRED: [&str; 7] = [
        "slipsync",
        "--pocketsmith-token",
        "key",
        "--pocketsmith-transaction-account",
        "42",
        "--transaction-meta-file",
        "meta.txt",
    ];

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let mut argv = REQUIRED.to_vec();
        argv.extend([
            "--timezone",
            "Asia/Tokyo",
            "--transfer-phrase",
            "Interbank Transfer",
            "--any-payee",
            "--skip-streak-limit",
            "0",
            "--memo-style",
            "full",
            "--preserve-review",
            "--no-attachments",
        ]);
        let cli = Cli::try_parse_from(argv).unwrap();
        assert_eq!(cli.pocketsmith_transaction_account, 42);

        let mut cfg = Config::default();
        cli.policy.apply(&mut cfg);
        assert_eq!(cfg.timezone, "Asia/Tokyo");
        assert_eq!(cfg.matching.transfer_phrases, vec!["Interbank Transfer".to_string()]);
        assert!(!cfg.matching.require_transfer_phrase);
        assert_eq!(cfg.matching.streak_limit(), None);
        assert_eq!(cfg.matching.memo_style, MemoStyle::Full);
        assert_eq!(cfg.matching.review, ReviewPolicy::Preserve);
        assert!(!cfg.matching.assign_attachments);
        assert!(cfg.matching.infer_categories);
    }

    #[test]
    fn no_flags_keep_config() {
        let mut cfg = Config::default();
        cfg.matching.skip_streak_limit = 4;
        PolicyArgs::default().apply(&mut cfg);
        assert_eq!(cfg, {
            let mut expected = Config::default();
            expected.matching.skip_streak_limit = 4;
            expected
        });
    }

    #[test]
    fn default_log_filter_covers_every_crate() {
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        for krate in ["slipsync_cli", "slipsync_enrich", "slipsync_ingest"] {
            assert!(DEFAULT_LOG_FILTER.contains(&format!("{krate}=info")));
        }
    }

    #[test]
    fn version_embeds_build_sha() {
        assert!(VERSION.starts_with(env!("CARGO_PKG_VERSION")));
        assert!(VERSION.ends_with(&format!("({})", env!("SLIPSYNC_BUILD_SHA"))));
        assert!(!env!("SLIPSYNC_BUILD_SHA").is_empty());
    }

    #[test]
    fn account_must_be_positive() {
        let mut argv = REQUIRED.to_vec();
        argv[4] = "0";
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
