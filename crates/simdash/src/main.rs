use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use simdash::config::ConfigError;
use simdash::engine;
use simdash::format_diagnostics;
use simdash::frontends;
use simdash::Config;
use simdash::Engine;
use tokio::sync::watch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(version, about = "Simulated smart home, city and factory dashboard")]
struct Args {
    /// Configuration files, merged in order; the first definition of a field wins
    configs: Vec<PathBuf>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let (config, warnings) = match Config::from_files(&args.configs) {
        Ok(loaded) => loaded,
        Err(ConfigError::Invalid(rendered)) => {
            eprint!("{}", rendered);
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    if !warnings.is_empty() {
        eprint!("{}", format_diagnostics(&warnings));
    }
    if args.check {
        println!("Configuration OK");
        return Ok(ExitCode::SUCCESS);
    }

    // Stdout belongs to the console frontend.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(config.logging.filter())
        .init();

    tracing::info!("simdash starting");
    for path in &args.configs {
        tracing::info!("Loaded config from: {}", path.display());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let engine = Engine::from_config(&config.simulation);
    let (handle, engine_task) = engine::spawn(engine, config.simulation.tick(), shutdown_rx.clone());

    let mut tasks = Vec::new();
    for frontend in frontends::from_config(&config) {
        let name = frontend.name().to_string();
        tracing::info!("Starting {} frontend", name);
        let task = tokio::spawn(frontend.run(handle.clone(), shutdown_rx.clone()));
        tasks.push((name, task));
    }
    if tasks.is_empty() {
        tracing::warn!("No frontends enabled; the simulation runs unobserved");
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(true);

    for (name, task) in tasks {
        match task.await {
            Ok(Ok(())) => tracing::debug!("{} frontend stopped", name),
            Ok(Err(e)) => tracing::error!("{} frontend failed: {:#}", name, e),
            Err(e) => tracing::error!("{} frontend panicked: {}", name, e),
        }
    }
    drop(handle);
    engine_task.await?;

    tracing::info!("simdash stopped");
    Ok(ExitCode::SUCCESS)
}
