use std::io::Write;

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::SinkError;
use crate::fetch::Fetcher;
use crate::html;
use crate::matcher::{Matcher, TermKind};
use crate::paginate::Paginator;
use crate::settings::Settings;
use crate::sink::{CsvSink, MatchRecord};

/// Counts reported once the run is over.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub urls: usize,
    pub pages: usize,
    pub failed_pages: usize,
    pub matches: usize,
}

/// Scrape every target in order, streaming each page's matches to `sink`.
///
/// Fetch and status failures end the current target only. Sink failures abort the run.
pub async fn scrape_all<W: Write>(
    settings: &Settings,
    fetcher: &Fetcher,
    matcher: &Matcher,
    sink: &mut CsvSink<W>,
) -> Result<RunStats, SinkError> {
    let pb = ProgressBar::new(settings.targets.len() as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }

    let mut stats = RunStats::default();

    for target in &settings.targets {
        pb.set_message(target.to_string());
        scrape_target(target, settings, fetcher, matcher, sink, &mut stats).await?;
        stats.urls += 1;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Scraped {} URLs: {} pages ({} failed), {} matches",
        stats.urls, stats.pages, stats.failed_pages, stats.matches
    );

    Ok(stats)
}

async fn scrape_target<W: Write>(
    target: &Url,
    settings: &Settings,
    fetcher: &Fetcher,
    matcher: &Matcher,
    sink: &mut CsvSink<W>,
    stats: &mut RunStats,
) -> Result<(), SinkError> {
    let mut paginator = Paginator::new(settings.pagination, &settings.page_param, target);
    let mut url = target.clone();

    for page in 1..=settings.max_pages {
        info!("Scraping URL: {} (page {})", url, page);

        let fetched = match fetcher.get(&url).await {
            Ok(f) => f,
            Err(e) => {
                warn!("Error fetching {}: {}", url, e);
                stats.failed_pages += 1;
                return Ok(());
            }
        };
        stats.pages += 1;

        let parsed = html::parse(&fetched.body, &fetched.url);
        let scraped_at = Utc::now();
        let records: Vec<MatchRecord> = matcher
            .find(&parsed.text)
            .into_iter()
            .map(|hit| {
                let (keyword, ioc) = match hit.kind {
                    TermKind::Keyword => (Some(hit.term), None),
                    TermKind::Ioc => (None, Some(hit.term)),
                };
                MatchRecord {
                    source_url: target.to_string(),
                    page,
                    page_url: fetched.url.to_string(),
                    keyword,
                    ioc,
                    context: hit.context,
                    scraped_at,
                }
            })
            .collect();

        sink.append(&records)?;
        stats.matches += records.len();
        debug!("{} matches on {}", records.len(), fetched.url);

        if page == settings.max_pages {
            break;
        }
        match paginator.next(page + 1, parsed.next) {
            Some(next) => url = next,
            None => {
                debug!("No further pages for {}", target);
                break;
            }
        }
    }

    Ok(())
}
