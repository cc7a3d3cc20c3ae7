//! Entry point: parse flags, validate them, build the chosen `Attacker`,
//! and run the engine to completion (§6).

use clap::Parser;
use mimalloc::MiMalloc;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing_subscriber::EnvFilter;

use galick::attacker::{Attacker, StaticHttpAttacker};
use galick::cli::{Cli, Command, ValidatedConfig};
use galick::client::ClientConfig;
use galick::connection_pool::PoolConfig;
use galick::engine::{Engine, RunConfig};
use galick::errors::EngineError;
use galick::presenter;
use galick::script::ScriptedAttacker;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if let Some(Command::Version) = cli.command {
        print_version();
        return;
    }

    let config = match ValidatedConfig::try_from(cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = run(config).await {
        error!(error = %err, "fatal error");
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

async fn run(config: ValidatedConfig) -> Result<(), EngineError> {
    let client_config = ClientConfig {
        skip_tls_verify: config.insecure,
        pool_config: PoolConfig::default(),
    };

    let attacker = if let Some(script_path) = &config.script {
        let client = galick::client::build_client(&client_config).map_err(EngineError::ClientBuild)?;
        Attacker::Scripted(ScriptedAttacker::load(script_path, client)?)
    } else {
        let url = config.url.clone().expect("validated: url present when script absent");
        let method = reqwest::Method::from_bytes(config.method.as_bytes())
            .expect("validated: method is a valid HTTP method");
        Attacker::StaticHttp(
            StaticHttpAttacker::build(&client_config, method, url, None)
                .map_err(EngineError::ClientBuild)?,
        )
    };

    let run_config = RunConfig {
        rate: config.qps,
        workers: config.workers,
        duration: config.duration,
        timeout: config.timeout,
        headless: config.headless,
    };

    let engine = Engine::new(attacker, run_config);
    let cancel = CancellationToken::new();

    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_cancel.cancel();
        }
    });

    if config.headless {
        let report = engine.run(cancel).await;
        presenter::print_headless_report(&report);
        Ok(())
    } else {
        let presenter_cancel = cancel.clone();
        let stats_for_presenter = std::sync::Arc::new(tokio::sync::Mutex::new(None));
        let run_stats = std::sync::Arc::clone(&stats_for_presenter);
        let total_duration = config.duration;
        let live_stats = engine.stats_handle();

        let engine_task = tokio::spawn(async move {
            let report = engine.run(cancel).await;
            *run_stats.lock().await = Some(report);
        });

        presenter::run_live(total_duration, presenter_cancel, || live_stats.snapshot()).await?;

        let _ = engine_task.await;
        if let Some(report) = stats_for_presenter.lock().await.take() {
            presenter::print_headless_report(&report);
        }
        Ok(())
    }
}

fn print_version() {
    let git_hash = option_env!("GIT_HASH").unwrap_or("unknown");
    let target = option_env!("BUILD_TARGET").unwrap_or("unknown");
    println!("galick {} ({}) {}", env!("CARGO_PKG_VERSION"), git_hash, target);
}
