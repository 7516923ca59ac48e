use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::Path;
use tracing::{info, warn};

use oi_concentration::config::Config;
use oi_concentration::exchange::{MockTransport, TaifexTransport, Transport};
use oi_concentration::pipeline::Pipeline;
use oi_concentration::text::today_in_offset;

#[derive(Parser)]
#[command(name = "oi_update")]
#[command(about = "Update the large-trader open interest document for single-stock futures")]
struct Cli {
    #[arg(long, default_value = "config/oi_concentration.toml")]
    config: String,
    /// Overrides `output_path` from the config
    #[arg(long)]
    output: Option<String>,
    /// Exchange-local date to query, YYYYMMDD
    #[arg(long)]
    date: Option<String>,
    /// Use the synthetic in-process exchange
    #[arg(long)]
    mock: bool,
}

fn load_config(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        info!("Loading config from {}", path);
        Config::load(path)
    } else {
        warn!("Config {} not found, using built-in defaults", path);
        Ok(Config::default())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(output) = cli.output {
        config.output_path = output;
    }
    if cli.mock {
        config.mock.enabled = true;
    }

    let today = match cli.date.as_deref() {
        Some(d) => NaiveDate::parse_from_str(d, "%Y%m%d")
            .with_context(|| format!("Invalid --date {}, expected YYYYMMDD", d))?,
        None => today_in_offset(config.utc_offset_hours),
    };

    let transport: Box<dyn Transport> = if config.mock.enabled {
        config.politeness_delay_ms = 0;
        let date = today.format("%Y/%m/%d").to_string();
        Box::new(MockTransport::synthetic(&config.targets, &date))
    } else {
        Box::new(TaifexTransport::new(&config.exchange)?)
    };

    let state = Pipeline::new(config, transport).run(today).await?;
    info!(
        "Done: date={} items={} history={}",
        state.date,
        state.items.len(),
        state.history.len()
    );

    Ok(())
}
