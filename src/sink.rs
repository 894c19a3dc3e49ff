use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::SinkError;

pub const HEADER: [&str; 7] = [
    "source_url",
    "page",
    "page_url",
    "keyword",
    "ioc",
    "context",
    "scraped_at",
];

/// One matched term on one page. Exactly one of `keyword` / `ioc` is set.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRecord {
    pub source_url: String,
    pub page: u32,
    pub page_url: String,
    pub keyword: Option<String>,
    pub ioc: Option<String>,
    pub context: String,
    #[serde(serialize_with = "rfc3339")]
    pub scraped_at: DateTime<Utc>,
}

fn rfc3339<S: serde::Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Streaming CSV writer: header on open, flush after every page.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl CsvSink<File> {
    /// Create (or truncate) `path` and write the header row.
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        let file = File::create(path)?;
        Self::new(file)
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Result<Self, SinkError> {
        // Header is written by hand so an empty run still gets one.
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(Self { writer, rows: 0 })
    }

    /// Append one page's records and flush them to the underlying writer.
    pub fn append(&mut self, records: &[MatchRecord]) -> Result<(), SinkError> {
        for record in records {
            self.writer.serialize(record)?;
        }
        self.writer.flush()?;
        self.rows += records.len();
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }
}
