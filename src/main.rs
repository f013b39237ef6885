//! Reddit Lead Monitor — Binary Entrypoint
//! One pass per invocation; an external scheduler (cron) runs it periodically.
//!
//! Exit codes: 0 = nothing relevant, 1 = relevant items found (the harness
//! forwards those downstream), 2 = hard failure (bad config, corrupt ledger,
//! all sources down).

use std::process::ExitCode;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reddit_lead_monitor::classify::OpenAiClassifier;
use reddit_lead_monitor::config::{self, MonitorConfig};
use reddit_lead_monitor::ingest::providers::reddit::RedditProvider;
use reddit_lead_monitor::ledger::{FileLedger, SeenLedger};
use reddit_lead_monitor::pipeline;
use reddit_lead_monitor::reply::ReplyTemplate;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("reddit_lead_monitor=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

async fn run() -> anyhow::Result<reddit_lead_monitor::RunReport> {
    let cfg = MonitorConfig::load_default()?;

    // Credential check happens before any network or ledger work.
    let api_key = config::require_openai_key()?;

    let mut ledger = FileLedger::load(&cfg.ledger_path)?;
    tracing::info!(
        sources = cfg.sources.len(),
        seen = ledger.len(),
        max_age_minutes = cfg.max_age_minutes,
        "starting monitor run"
    );

    let provider = RedditProvider::new(&cfg.user_agent, cfg.post_limit, cfg.comment_limit)?;
    let eval_prompt = cfg.load_eval_prompt()?;
    let classifier = OpenAiClassifier::new(api_key, &cfg.model, eval_prompt)?;
    let reply = ReplyTemplate::from_file(&cfg.reply_template_path)?;

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    let report = pipeline::run_once(&cfg, &provider, &mut ledger, &classifier, &reply, now).await?;

    report.write_json(&cfg.output_path)?;
    Ok(report)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run().await {
        Ok(report) => {
            println!("{}", report.render_summary());
            ExitCode::from(report.outcome().exit_code())
        }
        Err(e) => {
            tracing::error!(error = ?e, "monitor run failed");
            eprintln!("monitor run failed: {e:#}");
            ExitCode::from(2)
        }
    }
}
