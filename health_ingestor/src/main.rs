use std::{process::ExitCode, time::Duration};

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use health_ingestor::{
    cli::{
        commands::{Cli, Commands, RangeArgs},
        params::build_request,
        render,
    },
    config::Config,
    models::metric::MetricRegistry,
    providers::fitbit_rest::FitbitClient,
    requests::historical::{FetchContext, fetch_series, fetch_summary},
};
use log::info;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_path(path).with_context(|| format!("loading config {path}"))?,
        None => Config::default(),
    };
    let registry = MetricRegistry::standard();

    match cli.command {
        Commands::Metrics => {
            for descriptor in registry.iter() {
                println!(
                    "{:<20} max span {:<6} {}/{}",
                    descriptor.kind.as_str(),
                    descriptor.max_span.to_string(),
                    config.api.base_url.trim_end_matches('/'),
                    descriptor.endpoint_template
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Series(args) => run(&config, &registry, &args, false).await,
        Commands::Summary(args) => run(&config, &registry, &args, true).await,
    }
}

async fn run(
    config: &Config,
    registry: &MetricRegistry,
    args: &RangeArgs,
    summarize: bool,
) -> anyhow::Result<ExitCode> {
    let request = build_request(args, config, registry, Local::now().date_naive())?;
    let client = FitbitClient::from_env(&config.api)?;
    let ctx = FetchContext::new(&client, config.api.base_url.clone());

    let cancel = CancellationToken::new();
    if let Some(secs) = args.timeout_secs {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            info!("timeout of {secs}s reached, no further chunks will start");
            token.cancel();
        });
    }

    let rendered = if summarize {
        render(&fetch_summary(&ctx, &request, &cancel).await?)?
    } else {
        render(&fetch_series(&ctx, &request, &cancel).await?)?
    };
    cancel.cancel();

    println!("{}", rendered.json);
    for note in &rendered.notes {
        eprintln!("{note}");
    }
    Ok(ExitCode::from(rendered.exit_code))
}
