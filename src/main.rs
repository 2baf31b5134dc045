use anyhow::Context;
use envconfig::Envconfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod countries;
mod error;
mod feeds;
mod fetch;
mod store;
mod sync;

#[tokio::main]
async fn main() {
    // initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = config::Config::init_from_env().context("invalid configuration")?;
    let countries = countries::get_countries(config.countries_path.as_deref())?;
    if countries.is_empty() {
        tracing::warn!("country list is empty, nothing to update");
    }

    let fetcher = fetch::Fetcher::new(&config.base_url, config.request_timeout())
        .context("cannot build HTTP client")?;
    let updater = sync::Updater::new(fetcher, &config.output_dir)
        .workers(config.workers())
        .fail_fast(config.fail_fast);

    tracing::debug!("fetching from {}", config.base_url);
    updater.run(&countries).await?;

    if let Some(site) = config.site() {
        feeds::publish(&site, &countries, updater.output_dir()).await?;
    }

    Ok(())
}
