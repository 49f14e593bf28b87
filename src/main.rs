use anyhow::Context;
use clap::{Parser, Subcommand};
use fxwatch::config::AppConfig;
use fxwatch::monitor::RateMonitor;
use fxwatch::observability::metrics::register_metrics;
use fxwatch::observability::tracing::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "fxwatch", version, about = "USD/BRL exchange rate monitor")]
struct Cli {
    /// Configuration layer loaded from config/<env>
    #[arg(long, env = "FXWATCH_ENV", default_value = "development")]
    env: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the rate once
    Once,
    /// Sample the rate on an interval until Ctrl-C
    Watch {
        /// Minutes between samples
        #[arg(long)]
        interval: Option<f64>,
    },
    /// Show persisted session counters
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);
    register_metrics();

    let config = AppConfig::load(&cli.env).context("loading configuration")?;
    let monitor = RateMonitor::from_config(&config).context("building source chain")?;
    monitor.init().await;

    match cli.command.unwrap_or(Command::Once) {
        Command::Once => {
            let sample = monitor.acquire_rate().await;
            println!("{}", sample);
        }
        Command::Watch { interval } => {
            let interval = interval.unwrap_or(config.monitor.interval_minutes);
            monitor
                .start_continuous_update(interval, |sample, update_number| {
                    println!("#{} {}", update_number, sample);
                })
                .await?;

            tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
            monitor.stop_continuous_update().await;
            monitor.flush().await.context("writing session state")?;

            if let Some(summary) = monitor.variation_summary() {
                println!(
                    "{} samples, R$ {:.2} -> R$ {:.2} ({} {}), min R$ {:.2}, max R$ {:.2}",
                    summary.count,
                    summary.first_rate,
                    summary.last_rate,
                    summary.direction.symbol(),
                    summary.percent_change,
                    summary.min_rate,
                    summary.max_rate,
                );
            }
        }
        Command::Info => {
            let info = monitor.session_info().await;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}
