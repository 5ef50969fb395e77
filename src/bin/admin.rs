//! CLI administration tool for tiered-shortener.
//!
//! Creates, resolves and deletes short URLs and checks the database without
//! going through the HTTP API. Uses the same configuration and wiring as the
//! server, so codes come from the configured generator and both cache layers
//! are kept consistent.
//!
//! # Usage
//!
//! ```bash
//! # Shorten a URL
//! cargo run --bin admin -- shorten https://example.com/a
//!
//! # Shorten with a custom code
//! cargo run --bin admin -- shorten https://example.com/a --code hello
//!
//! # Look up a code
//! cargo run --bin admin -- resolve hello
//!
//! # Delete a code
//! cargo run --bin admin -- delete hello
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server; see `tiered_shortener::config`.

use tiered_shortener::application::services::{NewShortUrl, UrlService, UrlServiceError};
use tiered_shortener::config::{Config, mask_connection_string};
use tiered_shortener::server::{build_url_service, connect_database};
use tiered_shortener::telemetry::NoopMetrics;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing tiered-shortener.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
enum Commands {
    /// Create a short URL
    Shorten {
        /// The long URL (http or https)
        url: String,

        /// Custom short code (4-10 characters)
        #[arg(short, long)]
        code: Option<String>,
    },

    /// Show the long URL for a short code
    Resolve {
        /// Short code to look up
        code: String,
    },

    /// Delete a short code
    Delete {
        /// Short code to delete
        code: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    let pool = connect_database(&config).await?;

    match cli.command {
        Commands::Db { action } => handle_db_action(action, &config, &pool).await?,
        command => {
            config.validate()?;
            let service =
                build_url_service(&config, Arc::new(pool.clone()), NoopMetrics::arc()).await?;
            handle_url_command(command, &service).await?;
        }
    }

    pool.close().await;

    Ok(())
}

/// Dispatches short URL commands.
async fn handle_url_command(command: Commands, service: &UrlService) -> Result<()> {
    match command {
        Commands::Shorten { url, code } => shorten(service, url, code).await,
        Commands::Resolve { code } => resolve(service, &code).await,
        Commands::Delete { code, yes } => delete(service, &code, yes).await,
        Commands::Db { .. } => Ok(()),
    }
}

/// Creates a short URL and prints it.
async fn shorten(service: &UrlService, url: String, code: Option<String>) -> Result<()> {
    println!("{}", "✂️  Shorten URL".bright_blue().bold());
    println!();

    let created = service
        .shorten(NewShortUrl {
            long_url: url,
            custom_code: code,
        })
        .await;

    match created {
        Ok(created) => {
            println!("  Code:      {}", created.short_code.bright_yellow().bold());
            println!("  Short URL: {}", created.short_url.cyan());
            println!("  Long URL:  {}", created.long_url.bright_black());
            println!();
            println!("{}", "✅ Short URL created".green().bold());
            Ok(())
        }
        Err(UrlServiceError::InvalidUrl(reason)) => {
            println!("{} {}", "❌ Invalid input:".red(), reason);
            Ok(())
        }
        Err(UrlServiceError::CustomCodeTaken(code)) => {
            println!("{} {}", "❌ Code already taken:".red(), code.yellow());
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Failed to shorten URL: {}", e)),
    }
}

/// Prints the record behind a short code.
async fn resolve(service: &UrlService, code: &str) -> Result<()> {
    println!("{}", "🔍 Resolve short code".bright_blue().bold());
    println!();

    match service.resolve(code).await {
        Ok(record) => {
            println!("  Code:     {}", record.short_code.bright_yellow().bold());
            println!("  Long URL: {}", record.long_url.cyan());
            println!(
                "  Created:  {}",
                record
                    .created_at
                    .format("%Y-%m-%d %H:%M:%S UTC")
                    .to_string()
                    .bright_black()
            );
            match record.expires_at {
                Some(expires_at) => println!(
                    "  Expires:  {}",
                    expires_at.format("%Y-%m-%d %H:%M:%S UTC").to_string().yellow()
                ),
                None => println!("  Expires:  {}", "never".bright_black()),
            }
            println!();
            Ok(())
        }
        Err(UrlServiceError::NotFound(_)) => {
            println!("{}", "⚠️  Short code not found".yellow());
            Ok(())
        }
        Err(UrlServiceError::Expired(_)) => {
            println!("{}", "⚠️  Short code has expired".yellow());
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Failed to resolve code: {}", e)),
    }
}

/// Deletes a short code with confirmation prompt.
///
/// # Safety
///
/// - Requires confirmation (default: No) unless `--yes` is given
async fn delete(service: &UrlService, code: &str, skip_confirm: bool) -> Result<()> {
    println!("{}", "🗑️  Delete short code".bright_blue().bold());
    println!();
    println!("  Code: {}", code.cyan());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete this short code?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    match service.delete(code).await {
        Ok(()) => {
            println!("{}", "✅ Short code deleted".green().bold());
            Ok(())
        }
        Err(UrlServiceError::NotFound(_)) => {
            println!("{}", "⚠️  Short code not found".yellow());
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Failed to delete code: {}", e)),
    }
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, config: &Config, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM urls")
                .fetch_one(pool)
                .await?;

            let live: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM urls WHERE expires_at IS NULL OR expires_at > NOW()",
            )
            .fetch_one(pool)
            .await?;

            println!(
                "  Database:   {}",
                mask_connection_string(&config.database_url).bright_white()
            );
            println!("  PostgreSQL: {}", version.bright_white());
            println!(
                "  URLs:       {} ({} live)",
                total.to_string().bright_green().bold(),
                live.to_string().green()
            );
            println!();
        }
    }

    Ok(())
}
