//! CLI administration tool for attribution-relay.
//!
//! Provides commands for validating configuration, previewing dispatch
//! plans, and firing targets manually without a running server.
//!
//! # Usage
//!
//! ```bash
//! # Validate and summarize the loaded configuration
//! cargo run --bin admin -- config check
//!
//! # Preview the dispatch plan for a query string
//! cargo run --bin admin -- plan --query "gclid=abc&utm_source=google"
//!
//! # Fire all targets once from the terminal
//! cargo run --bin admin -- fire --query "gclid=abc" --yes
//! ```
//!
//! # Environment Variables
//!
//! Reads the same variables as the server, most importantly `TARGET_URLS`
//! and `TARGET_REFERERS`.
//!
//! # Features
//!
//! - **Config Check**: Per-entry target validation with referer shape
//! - **Plan Preview**: Exact merged URLs and referers, no network
//! - **Manual Fire**: One real dispatch batch with per-target outcomes
//! - **Interactive Prompts**: Confirmation before firing real traffic
//! - **Colored Output**: Terminal-friendly formatting using `colored` crate

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;

use attribution_relay::application::services::RelayService;
use attribution_relay::config::{self, Config};
use attribution_relay::domain::dispatch::DispatchSummary;
use attribution_relay::infrastructure::forwarder::HttpForwarder;

/// CLI tool for managing attribution-relay.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Configuration operations
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show the dispatch plan for a query string
    Plan {
        /// Query string as a visitor would send it (without the '?')
        #[arg(short, long, default_value = "")]
        query: String,

        /// Browser Referer to assume for fallback policies
        #[arg(long)]
        referer: Option<String>,
    },

    /// Fire all targets once from the terminal
    Fire {
        /// Query string as a visitor would send it (without the '?')
        #[arg(short, long, default_value = "")]
        query: String,

        /// Browser Referer to assume for fallback policies
        #[arg(long)]
        referer: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Configuration subcommands.
#[derive(Subcommand)]
enum ConfigAction {
    /// Validate the environment configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Check => check_config(&config),
        },
        Commands::Plan { query, referer } => {
            show_plan(&config, &query, referer.as_deref())?;
        }
        Commands::Fire {
            query,
            referer,
            yes,
        } => {
            fire_targets(&config, &query, referer.as_deref(), yes).await?;
        }
    }

    Ok(())
}

/// Prints the classified configuration with per-target validation.
fn check_config(config: &Config) {
    println!("{}", "🔍 Configuration Check".bright_blue().bold());
    println!();

    if config.targets.is_empty() {
        println!("{}", "  ⚠️  No targets configured".yellow());
    } else {
        println!("{}", "Targets:".bright_white().bold());
        for (index, entry) in config.targets.entries().iter().enumerate() {
            match url::Url::parse(entry) {
                Ok(_) => println!("  {} {}", format!("[{index}]").bright_black(), entry.cyan()),
                Err(e) => println!(
                    "  {} {} {}",
                    format!("[{index}]").bright_black(),
                    entry.red(),
                    format!("({e})").red()
                ),
            }
        }
    }

    println!();
    println!(
        "  Referer policy:   {}",
        config.referers.describe().bright_white()
    );
    println!(
        "  Dispatch timeout: {}",
        format!("{}ms", config.dispatch_timeout_ms).bright_white()
    );
    println!(
        "  Landing trigger:  {}",
        if config.trigger_on_landing {
            config.landing_paths.join(", ").bright_white()
        } else {
            "disabled".yellow()
        }
    );
    if !config.redirect_rules.is_empty() {
        println!(
            "  Redirect rules:   {}",
            config.redirect_rules.len().to_string().bright_white()
        );
    }

    println!();
    println!("{}", "✅ Configuration valid".green().bold());
}

/// Builds the relay service exactly as the server does.
fn build_relay(config: &Config) -> Result<RelayService<HttpForwarder>> {
    let forwarder = Arc::new(HttpForwarder::new(config.dispatch_timeout())?);
    Ok(RelayService::new(
        forwarder,
        config.targets.clone(),
        config.referers.clone(),
        config.dispatch_timeout(),
    ))
}

/// Shows merged URLs and chosen referers without any network activity.
fn show_plan(config: &Config, query: &str, referer: Option<&str>) -> Result<()> {
    println!("{}", "📋 Dispatch Plan".bright_blue().bold());
    println!();

    let relay = build_relay(config)?;
    let plan = relay.plan(query, referer);

    println!("{}", "Attribution:".bright_white().bold());
    println!(
        "  sub_id:   {}",
        plan.record.sub_id.bright_yellow()
    );
    match &plan.record.click_id {
        Some(id) => println!("  click id: {}", id.cyan()),
        None => println!("  click id: {}", "none".bright_black()),
    }
    println!();

    if plan.jobs.is_empty() {
        println!("{}", "  No dispatchable targets".yellow());
        return Ok(());
    }

    println!("{}", "Jobs:".bright_white().bold());
    for job in &plan.jobs {
        println!(
            "  {} {}",
            format!("[{}]", job.target_index).bright_black(),
            job.url.as_str().cyan()
        );
        match &job.referer {
            Some(r) => println!("      Referer: {}", r.bright_white()),
            None => println!("      Referer: {}", "none".bright_black()),
        }
    }

    Ok(())
}

/// Fires one real dispatch batch and reports per-target outcomes.
async fn fire_targets(
    config: &Config,
    query: &str,
    referer: Option<&str>,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🚀 Fire Targets".bright_blue().bold());
    println!();

    let relay = build_relay(config)?;
    let plan = relay.plan(query, referer);

    if plan.jobs.is_empty() {
        println!("{}", "  No dispatchable targets".yellow());
        return Ok(());
    }

    println!(
        "  {} target(s), sub_id {}",
        plan.jobs.len().to_string().bright_white().bold(),
        plan.record.sub_id.bright_yellow()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Send real requests to these targets?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let outcomes = relay.dispatch_all(plan.jobs).await;
    let summary = DispatchSummary::from_outcomes(&outcomes);

    println!();
    for outcome in &outcomes {
        match &outcome.result {
            Ok(status) => println!(
                "  {} {} {}",
                "✅".green(),
                outcome.target.cyan(),
                status.to_string().green().bold()
            ),
            Err(e) => println!("  {} {} {}", "❌".red(), outcome.target.cyan(), e.to_string().red()),
        }
    }

    println!();
    println!(
        "  Delivered {} of {}",
        summary.delivered.to_string().green().bold(),
        summary.attempted.to_string().bright_white().bold()
    );

    Ok(())
}
