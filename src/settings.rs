use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::error::ConfigError;
use crate::matcher;
use crate::paginate::Strategy;

const DEFAULT_TIMEOUT_SECS: i64 = 10;
const DEFAULT_CONTEXT_CHARS: i64 = 200;
const DEFAULT_PAGE_PARAM: &str = "page";
const DEFAULT_USER_AGENT: &str = concat!("osint_scraper/", env!("CARGO_PKG_VERSION"));

#[derive(Parser, Debug)]
#[command(
    name = "osint_scraper",
    version,
    about = "Scrape OSINT sources for mentions of keywords or IOCs"
)]
pub struct Cli {
    /// Keywords to search for (case-insensitive)
    #[arg(short = 'k', long = "keywords", num_args = 1.., required = true)]
    pub keywords: Vec<String>,

    /// File of IOCs, one per line (matched case-sensitively)
    #[arg(short = 'i', long = "ioc_file")]
    pub ioc_file: Option<PathBuf>,

    /// URLs to scrape
    #[arg(short = 'u', long = "urls", num_args = 1.., required = true)]
    pub urls: Vec<String>,

    /// Output CSV file path
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Max pages to scrape per URL
    #[arg(long = "max_pages", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: u32,

    /// How to find the next page of a URL
    #[arg(long, value_enum, default_value_t = Strategy::Auto)]
    pub pagination: Strategy,

    /// Query parameter holding the page number [env: OSINT_PAGE_PARAM]
    #[arg(long = "page_param")]
    pub page_param: Option<String>,

    /// Per-request timeout in seconds [env: OSINT_TIMEOUT_SECS]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Width of the context snippet stored with each match [env: OSINT_CONTEXT_CHARS]
    #[arg(long = "context_chars")]
    pub context_chars: Option<usize>,
}

/// Values that may come from `OSINT_*` environment variables.
#[derive(Debug, Deserialize)]
pub struct EnvSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub context_chars: usize,
    pub page_param: String,
}

impl EnvSettings {
    /// Defaults overlaid with `OSINT_*` variables. `source` replaces the process
    /// environment when given.
    pub fn load(source: Option<config::Map<String, String>>) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("user_agent", DEFAULT_USER_AGENT)?
            .set_default("context_chars", DEFAULT_CONTEXT_CHARS)?
            .set_default("page_param", DEFAULT_PAGE_PARAM)?
            .add_source(
                config::Environment::with_prefix("OSINT")
                    .try_parsing(true)
                    .source(source),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

/// Everything one run needs, validated. Built once, passed by reference.
#[derive(Debug, Clone)]
pub struct Settings {
    pub targets: Vec<Url>,
    pub skipped_urls: Vec<String>,
    pub keywords: Vec<String>,
    pub iocs: Vec<String>,
    pub output: PathBuf,
    pub max_pages: u32,
    pub pagination: Strategy,
    pub page_param: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub context_chars: usize,
}

impl Settings {
    /// Merge CLI flags over environment values. CLI wins.
    pub fn resolve(cli: Cli, env: EnvSettings) -> Result<Self, ConfigError> {
        let keywords = matcher::normalize_keywords(&cli.keywords);
        if keywords.is_empty() {
            return Err(ConfigError::NoKeywords);
        }

        let (targets, skipped_urls) = parse_targets(&cli.urls);
        if targets.is_empty() {
            return Err(ConfigError::NoUrls);
        }

        // OSINT_TIMEOUT_SECS bypasses the clap range check.
        let timeout_secs = cli.timeout.unwrap_or(env.timeout_secs);
        if timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let iocs = match &cli.ioc_file {
            Some(path) => {
                let contents =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::IocFile {
                        path: path.clone(),
                        source,
                    })?;
                let iocs = matcher::parse_iocs(&contents);
                if iocs.is_empty() {
                    warn!("IOC file {} has no entries", path.display());
                }
                iocs
            }
            None => Vec::new(),
        };

        Ok(Self {
            targets,
            skipped_urls,
            keywords,
            iocs,
            output: cli.output,
            max_pages: cli.max_pages,
            pagination: cli.pagination,
            page_param: cli.page_param.unwrap_or(env.page_param),
            timeout_secs,
            user_agent: env.user_agent,
            context_chars: cli.context_chars.unwrap_or(env.context_chars),
        })
    }
}

/// Keep well-formed http(s) URLs in order; warn about and return the rest.
fn parse_targets(raw: &[String]) -> (Vec<Url>, Vec<String>) {
    let mut targets = Vec::new();
    let mut skipped = Vec::new();

    for entry in raw {
        match Url::parse(entry.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
                targets.push(url)
            }
            Ok(url) => {
                warn!("Skipping {}: unsupported scheme '{}'", entry, url.scheme());
                skipped.push(entry.clone());
            }
            Err(e) => {
                warn!("Skipping malformed URL {}: {}", entry, e);
                skipped.push(entry.clone());
            }
        }
    }

    (targets, skipped)
}
