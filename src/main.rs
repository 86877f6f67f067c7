mod collectors;
mod config;
mod monitor;
mod render;
mod sampler;
mod snapshot;

use clap::Parser;
use collectors::system::host_identity;
use config::{Config, OutputFormat};
use monitor::{run_monitor, IntervalPacer, MonitorOptions, DISK_PATH, SAMPLE_INTERVAL};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hostmon")]
#[command(version)]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    print_default_config: bool,
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return;
    }

    let mut cfg = match &cli.config {
        Some(path) => match Config::load_from_file(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                error!(error = %err, "не удалось загрузить конфигурацию");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    if cli.json {
        cfg.output = OutputFormat::Json;
    }

    info!(
        interval_secs = SAMPLE_INTERVAL.as_secs(),
        disk_path = DISK_PATH,
        output = ?cfg.output,
        "запуск hostmon"
    );

    let host = host_identity();
    let options = MonitorOptions::from(&cfg);
    let mut source = collectors::default_source();
    let mut pacer = IntervalPacer::new(SAMPLE_INTERVAL);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("получен Ctrl+C, выполняется остановка");
                let _ = shutdown_tx.send(true);
            }
            Err(err) => {
                // Keep the sender alive so the loop runs until the process is killed.
                error!(error = %err, "не удалось дождаться Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    });

    let mut stdout = std::io::stdout().lock();
    let result = run_monitor(
        &mut *source,
        &mut pacer,
        &mut stdout,
        &options,
        &host,
        shutdown_rx,
    )
    .await;

    if let Err(err) = result {
        error!(error = %err, "ошибка вывода, цикл сбора остановлен");
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
