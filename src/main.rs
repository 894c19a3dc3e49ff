mod error;
mod fetch;
mod html;
mod matcher;
mod paginate;
mod run;
mod settings;
mod sink;

use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use error::ConfigError;
use settings::{Cli, EnvSettings, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    // Everything that can be wrong with the invocation fails here, before any request.
    let settings = Settings::resolve(cli, EnvSettings::load(None)?)?;
    let matcher = matcher::Matcher::new(&settings.keywords, &settings.iocs, settings.context_chars)
        .context("Failed to compile search terms")?;
    let fetcher = fetch::Fetcher::new(settings.timeout_secs, &settings.user_agent)
        .map_err(ConfigError::Client)?;
    let mut sink = sink::CsvSink::create(&settings.output).map_err(|source| ConfigError::Output {
        path: settings.output.clone(),
        source,
    })?;

    info!(
        "Searching {} URLs for {} keywords and {} IOCs (max {} pages each)",
        settings.targets.len(),
        settings.keywords.len(),
        settings.iocs.len(),
        settings.max_pages
    );

    let stats = run::scrape_all(&settings, &fetcher, &matcher, &mut sink)
        .await
        .with_context(|| format!("Failed writing {}", settings.output.display()))?;
    let written = sink.rows();
    sink.into_inner()
        .with_context(|| format!("Failed closing {}", settings.output.display()))?;

    println!(
        "Done: {} URLs ({} skipped), {} pages fetched ({} failed), {} matches written to {}",
        stats.urls,
        settings.skipped_urls.len(),
        stats.pages,
        stats.failed_pages,
        written,
        settings.output.display()
    );

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("Done in {}", format_duration(elapsed));
    }

    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
