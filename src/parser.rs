//! Install Log Ingestion
//!
//! Reads install logs in delimited text form, one installation per line:
//!
//! ```text
//! ComputerID,UserID,ApplicationID,ComputerType
//! 1,1,374,DESKTOP
//! 2,1,374,laptop
//! ```
//!
//! Columns are positional (device, user, application, category); the header line is
//! skipped and neither its names nor its width are checked. Categories match case-insensitively. When an
//! application id is configured, rows for other applications are dropped.

use crate::config::IngestionConfig;
use crate::error::SourceError;
use crate::models::{Category, InstallRecord};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fmt::Display;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const COLUMNS: usize = 4;

/// Records read from one or more logs, with row counts for reporting.
#[derive(Debug, Clone, Default)]
pub struct IngestionOutcome {
    pub records: Vec<InstallRecord>,
    pub files: Vec<PathBuf>,
    pub rows_read: usize,
    /// Rows dropped by the application filter
    pub rows_filtered: usize,
}

impl IngestionOutcome {
    fn merge(&mut self, other: IngestionOutcome) {
        self.records.extend(other.records);
        self.files.extend(other.files);
        self.rows_read += other.rows_read;
        self.rows_filtered += other.rows_filtered;
    }
}

#[derive(Debug, Clone)]
pub struct InstallLogReader {
    application_id: Option<u64>,
    delimiter: u8,
    has_headers: bool,
}

impl Default for InstallLogReader {
    fn default() -> Self {
        Self::new(&IngestionConfig::default())
    }
}

impl InstallLogReader {
    pub fn new(config: &IngestionConfig) -> Self {
        Self {
            application_id: config.application_id,
            // Config validation guarantees an ASCII delimiter.
            delimiter: u8::try_from(config.delimiter).unwrap_or(b','),
            has_headers: config.has_headers,
        }
    }

    /// Restricts ingestion to one application; `None` keeps every row.
    pub fn with_application(mut self, application_id: Option<u64>) -> Self {
        self.application_id = application_id;
        self
    }

    pub fn read_file(&self, path: &Path) -> Result<IngestionOutcome, SourceError> {
        let file = File::open(path).map_err(|source| SourceError::Unavailable {
            path: path.to_path_buf(),
            source,
        })?;

        let mut outcome = self.read_from(file, path)?;
        outcome.files.push(path.to_path_buf());

        tracing::info!(
            path = %path.display(),
            rows_read = outcome.rows_read,
            rows_filtered = outcome.rows_filtered,
            "Read install log"
        );

        Ok(outcome)
    }

    /// Reads every file matching a glob pattern, in path order.
    pub fn read_pattern(&self, pattern: &str) -> Result<IngestionOutcome, SourceError> {
        let paths = glob::glob(pattern).map_err(|e| SourceError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let mut outcome = IngestionOutcome::default();
        for entry in paths {
            let path = entry.map_err(|e| SourceError::Unavailable {
                path: e.path().to_path_buf(),
                source: e.into(),
            })?;
            if path.is_file() {
                outcome.merge(self.read_file(&path)?);
            }
        }

        if outcome.files.is_empty() {
            return Err(SourceError::NoMatches {
                pattern: pattern.to_string(),
            });
        }

        Ok(outcome)
    }

    /// Parses a log from any reader; `source` only labels errors.
    pub fn read_from<R: Read>(&self, reader: R, source: &Path) -> Result<IngestionOutcome, SourceError> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_headers)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut outcome = IngestionOutcome::default();
        for row in csv_reader.records() {
            let row = row.map_err(|e| SourceError::Malformed {
                path: source.to_path_buf(),
                line: e.position().map(|p| p.line()).unwrap_or(0),
                reason: e.to_string(),
            })?;
            outcome.rows_read += 1;

            let line = row.position().map(|p| p.line()).unwrap_or(0);
            let record = parse_row(&row).map_err(|reason| SourceError::Malformed {
                path: source.to_path_buf(),
                line,
                reason,
            })?;

            match self.application_id {
                Some(wanted) if record.application_id != wanted => outcome.rows_filtered += 1,
                _ => outcome.records.push(record),
            }
        }

        if outcome.rows_filtered > 0 {
            tracing::debug!(
                source = %source.display(),
                rows_filtered = outcome.rows_filtered,
                application_id = ?self.application_id,
                "Dropped rows for other applications"
            );
        }

        Ok(outcome)
    }
}

fn parse_row(row: &StringRecord) -> Result<InstallRecord, String> {
    if row.len() != COLUMNS {
        return Err(format!("expected {} columns, found {}", COLUMNS, row.len()));
    }

    Ok(InstallRecord {
        device_id: field(row, 0, "device id")?,
        user_id: field(row, 1, "user id")?,
        application_id: field(row, 2, "application id")?,
        category: field::<Category>(row, 3, "category")?,
    })
}

fn field<T>(row: &StringRecord, index: usize, name: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = row.get(index).unwrap_or_default();
    raw.parse()
        .map_err(|e| format!("invalid {} {:?}: {}", name, raw, e))
}
