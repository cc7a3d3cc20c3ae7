//! Command-line surface (§6's flag table) and its validation into a
//! `RunConfig` plus the chosen `Attacker`.

use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::errors::ConfigError;

#[derive(Parser, Debug)]
#[command(name = "galick", about = "Open-loop HTTP load-testing engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Target URL. Mutually exclusive with --script.
    #[arg(short, long)]
    pub url: Option<String>,

    /// HTTP method for --url. Ignored when --script is used.
    #[arg(short, long, default_value = "GET")]
    pub method: String,

    /// Path to a script that builds each request. Mutually exclusive with --url.
    #[arg(short, long)]
    pub script: Option<String>,

    /// Requests per second.
    #[arg(short = 'q', long, default_value_t = 50)]
    pub qps: i64,

    /// Number of concurrent workers.
    #[arg(short, long, default_value_t = 10)]
    pub workers: i64,

    /// Total run duration.
    #[arg(short, long, value_parser = humantime::parse_duration, default_value = "10s")]
    pub duration: Duration,

    /// Per-request timeout.
    #[arg(short, long, value_parser = humantime::parse_duration, default_value = "10s")]
    pub timeout: Duration,

    /// Disable the live terminal dashboard; print only the final report.
    #[arg(long)]
    pub headless: bool,

    /// Skip TLS certificate and hostname verification.
    #[arg(short = 'k', long)]
    pub insecure: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print version, commit, and build target, then exit.
    Version,
}

/// A `Cli` that has passed §6's validation rules: exactly one target,
/// positive rate/workers/duration/timeout.
pub struct ValidatedConfig {
    pub url: Option<String>,
    pub method: String,
    pub script: Option<String>,
    pub qps: u32,
    pub workers: u32,
    pub duration: Duration,
    pub timeout: Duration,
    pub headless: bool,
    pub insecure: bool,
}

impl TryFrom<Cli> for ValidatedConfig {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        match (&cli.url, &cli.script) {
            (None, None) => return Err(ConfigError::MissingTarget),
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingTarget),
            _ => {}
        }

        if cli.qps <= 0 {
            return Err(ConfigError::InvalidRate(cli.qps));
        }
        if cli.workers <= 0 {
            return Err(ConfigError::InvalidWorkers(cli.workers));
        }

        if cli.url.is_some() {
            reqwest::Method::from_bytes(cli.method.as_bytes())
                .map_err(|_| ConfigError::InvalidMethod(cli.method.clone()))?;
        }

        if let Some(url) = &cli.url {
            reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidUrl(url.clone(), e.to_string()))?;
        }

        Ok(ValidatedConfig {
            url: cli.url,
            method: cli.method,
            script: cli.script,
            qps: cli.qps as u32,
            workers: cli.workers as u32,
            duration: cli.duration,
            timeout: cli.timeout,
            headless: cli.headless,
            insecure: cli.insecure,
        })
    }
}
