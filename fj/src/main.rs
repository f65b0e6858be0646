//! fanjoin - join strategy demo
//!
//! CLI entry point for fetching users and posts with a chosen strategy.

use std::fs;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result, eyre};
use tracing::{debug, info, warn};

use fanjoin::cli::{Cli, Command, OutputFormat, generate_after_help, get_log_path};
use fanjoin::config::Config;
use fanjoin::fetch::{ApiClient, FetchError, Post, PostsFetcher, User, UsersFetcher};
use fanjoin::join::JoinOutcome;
use fanjoin::strategy::{self, RunReport, Strategy};

fn setup_logging(verbose: bool) -> Result<()> {
    let log_path = get_log_path();

    // Create log directory
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Setup tracing subscriber - write to log file, not stdout/stderr
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Build command with after_help that shows where logs go
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "fanjoin loaded config: base_url={}, strategy={}",
        config.api.base_url, config.strategy
    );

    match cli.command {
        Some(Command::Fetch {
            strategy,
            base_url,
            format,
        }) => {
            let config = with_base_url(config, base_url);
            cmd_fetch(&config, strategy.unwrap_or(config.strategy), format).await
        }
        Some(Command::Compare { base_url }) => cmd_compare(&with_base_url(config, base_url)).await,
        Some(Command::Config) => cmd_config(&config),
        None => {
            Cli::command().after_help(generate_after_help()).print_help()?;
            println!();
            Ok(())
        }
    }
}

fn with_base_url(mut config: Config, base_url: Option<String>) -> Config {
    if let Some(url) = base_url {
        debug!(%url, "with_base_url: overriding base url");
        config.api.base_url = url;
    }
    config
}

type UsersAndPosts = RunReport<Vec<User>, Vec<Post>, FetchError>;

/// Run one strategy against the configured endpoints
async fn fetch_once(config: &Config, strategy: Strategy) -> Result<UsersAndPosts> {
    let client = ApiClient::from_config(&config.api).context("Failed to build HTTP client")?;
    let users = UsersFetcher::new(client.clone(), config.api.users_path.clone());
    let posts = PostsFetcher::new(client, config.api.posts_path.clone());

    info!(%strategy, users = %users.url(), posts = %posts.url(), "Fetching");
    Ok(strategy::run(strategy, users, posts).await)
}

/// Fetch once and print the result
async fn cmd_fetch(config: &Config, strategy: Strategy, format: OutputFormat) -> Result<()> {
    let report = fetch_once(config, strategy).await?;
    let elapsed_ms = report.elapsed.as_millis() as u64;

    match report.outcome {
        JoinOutcome::Success(users, posts) => {
            match format {
                OutputFormat::Json => {
                    let json = serde_json::json!({
                        "strategy": strategy,
                        "users": users.len(),
                        "posts": posts.len(),
                        "elapsed_ms": elapsed_ms,
                    });
                    println!("{}", serde_json::to_string_pretty(&json)?);
                }
                OutputFormat::Text => {
                    println!(
                        "{} {} {} users - {} posts in {}ms",
                        ">>> done".green(),
                        strategy,
                        users.len(),
                        posts.len(),
                        elapsed_ms
                    );
                }
            }
            Ok(())
        }
        JoinOutcome::Failure(e) => {
            warn!(%strategy, error = %e, "Fetch failed");
            Err(e).context(format!("{} fetch failed after {}ms", strategy, elapsed_ms))
        }
    }
}

/// Run every strategy and print one line each
async fn cmd_compare(config: &Config) -> Result<()> {
    let mut failures = 0;

    for strategy in Strategy::ALL {
        let report = fetch_once(config, strategy).await?;
        let elapsed_ms = report.elapsed.as_millis() as u64;

        match report.outcome {
            JoinOutcome::Success(users, posts) => {
                println!(
                    "{:<12} {:>4} users {:>4} posts {:>6}ms",
                    strategy.to_string().cyan(),
                    users.len(),
                    posts.len(),
                    elapsed_ms
                );
            }
            JoinOutcome::Failure(e) => {
                failures += 1;
                println!("{:<12} {} {}", strategy.to_string().cyan(), "failed:".red(), e);
            }
        }
    }

    if failures > 0 {
        return Err(eyre!("{} of {} strategies failed", failures, Strategy::ALL.len()));
    }
    Ok(())
}

/// Print the effective configuration as YAML
fn cmd_config(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}
