//! In-memory performance table and CSV loader
//!
//! The table keeps the dataset's header order and raw cell text. Numeric and
//! date values are parsed on access so that a dataset missing some columns
//! still loads; consumers decide whether an absent column is fatal.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Error, Result};

/// Well-known column names
pub mod columns {
    pub const DATE: &str = "date";
    pub const CAMPAIGN: &str = "campaign_name";
    pub const ADSET: &str = "adset_name";
    pub const PLATFORM: &str = "platform";
    pub const COUNTRY: &str = "country";
    pub const AUDIENCE: &str = "audience_type";
    pub const CREATIVE_TYPE: &str = "creative_type";
    pub const CREATIVE_MESSAGE: &str = "creative_message";
    pub const SPEND: &str = "spend";
    pub const IMPRESSIONS: &str = "impressions";
    pub const CLICKS: &str = "clicks";
    pub const CTR: &str = "ctr";
    pub const PURCHASES: &str = "purchases";
    pub const REVENUE: &str = "revenue";
    pub const ROAS: &str = "roas";
}

/// Row-oriented table of campaign performance records
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    digest: Option<String>,
}

impl Table {
    /// Create an empty table with the given column names
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers
                .into_iter()
                .map(|h| normalize_header(&h.into()))
                .collect(),
            rows: Vec::new(),
            digest: None,
        }
    }

    /// Append a row; the cell count must match the header count
    pub fn push_row<I, S>(&mut self, cells: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row: Vec<String> = cells.into_iter().map(Into::into).collect();
        if row.len() != self.headers.len() {
            return Err(Error::InvalidData(format!(
                "row {} has {} cells, expected {}",
                self.rows.len() + 1,
                row.len(),
                self.headers.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Parse CSV data with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let mut table = Table::new(headers.iter());
        let width = table.headers.len();

        for result in rdr.records() {
            let record = result?;
            // Short rows are padded so a trailing empty cell does not reject the file
            let mut row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
            row.resize(width, String::new());
            table.rows.push(row);
        }

        debug!(
            rows = table.rows.len(),
            columns = width,
            "Parsed performance table"
        );
        Ok(table)
    }

    /// Attach the SHA-256 digest of the source bytes
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Hex SHA-256 of the file the table was loaded from
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Index of a column (case-insensitive)
    pub fn column(&self, name: &str) -> Option<usize> {
        let name = normalize_header(name);
        self.headers.iter().position(|h| *h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Raw cell text, `None` when empty or out of range
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Numeric cell value; an empty cell is `Ok(None)`, a non-numeric one is an error
    pub fn number(&self, row: usize, col: usize) -> Result<Option<f64>> {
        self.cell(row, col)
            .map(|raw| {
                parse_number(raw).ok_or_else(|| {
                    Error::InvalidData(format!(
                        "column '{}' row {}: '{}' is not a number",
                        self.headers[col],
                        row + 1,
                        raw
                    ))
                })
            })
            .transpose()
    }

    /// Date cell value; an empty cell is `Ok(None)`, an unparseable one is an error
    pub fn date(&self, row: usize, col: usize) -> Result<Option<NaiveDate>> {
        self.cell(row, col).map(parse_date).transpose()
    }

    /// Indices of rows whose `column` equals `value`; `None` when the column is absent
    pub fn rows_where(&self, column: &str, value: &str) -> Option<Vec<usize>> {
        let col = self.column(column)?;
        Some(
            (0..self.rows.len())
                .filter(|&i| self.cell(i, col) == Some(value))
                .collect(),
        )
    }

    /// Distinct non-empty values of a column in ascending order
    pub fn distinct(&self, column: &str) -> Vec<String> {
        let Some(col) = self.column(column) else {
            return Vec::new();
        };
        let mut values: Vec<String> = (0..self.rows.len())
            .filter_map(|i| self.cell(i, col))
            .map(str::to_string)
            .collect();
        values.sort();
        values.dedup();
        values
    }
}

/// Loads the configured dataset from disk
pub struct DataLoader {
    path: PathBuf,
}

impl DataLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the dataset, fingerprinting the raw bytes
    pub fn load(&self) -> Result<Table> {
        if !self.path.exists() {
            return Err(Error::NotFound(format!("dataset {}", self.path.display())));
        }
        let bytes = fs::read(&self.path)?;
        let digest = hex::encode(Sha256::digest(&bytes));
        let table = Table::from_reader(bytes.as_slice())?.with_digest(digest);

        tracing::info!(
            path = %self.path.display(),
            rows = table.len(),
            "Loaded dataset"
        );
        Ok(table)
    }
}

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Parse a numeric cell, tolerating currency symbols and thousands separators
fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s.trim().replace(['$', ',', ' '], "");
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%d-%m-%Y", // 15-01-2024
    ];
    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    Err(Error::InvalidData(format!("Unable to parse date: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Date,Campaign_Name,ROAS,CTR\n\
                       2024-01-02,Alpha,3.5,0.012\n\
                       2024-01-01,Beta,1.5,\n\
                       01/03/2024,Alpha,2.0,0.009\n";

    #[test]
    fn test_from_reader_normalizes_headers() {
        let table = Table::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.headers(), &["date", "campaign_name", "roas", "ctr"]);
        assert_eq!(table.column("ROAS"), Some(2));
        assert!(!table.has_column("spend"));
    }

    #[test]
    fn test_number_parsing() {
        let table = Table::from_reader(CSV.as_bytes()).unwrap();
        let roas = table.column("roas").unwrap();
        let ctr = table.column("ctr").unwrap();
        assert_eq!(table.number(0, roas).unwrap(), Some(3.5));
        assert_eq!(table.number(1, roas).unwrap(), Some(1.5));
        assert_eq!(table.number(1, ctr).unwrap(), None);

        let mut t = Table::new(["spend"]);
        t.push_row(["$1,234.50"]).unwrap();
        t.push_row([""]).unwrap();
        t.push_row(["n/a"]).unwrap();
        assert_eq!(t.number(0, 0).unwrap(), Some(1234.5));
        assert_eq!(t.number(1, 0).unwrap(), None);
        assert!(matches!(t.number(2, 0), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_date_formats() {
        assert_eq!(
            parse_date("2024-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(
            parse_date("01/15/2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(
            parse_date("2024-01-15 08:30:00").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(
            parse_date("2024-01-15T23:59:59").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(
            parse_date("15-01-2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert!(parse_date("yesterday").is_err());
        assert!(parse_date("2024-01-15T08:30").is_err());
    }

    #[test]
    fn test_push_row_width_mismatch() {
        let mut table = Table::new(["date", "roas"]);
        assert!(table.push_row(["2024-01-01"]).is_err());
        assert!(table.push_row(["2024-01-01", "2.0"]).is_ok());
    }

    #[test]
    fn test_rows_where_and_distinct() {
        let table = Table::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.rows_where("campaign_name", "Alpha"), Some(vec![0, 2]));
        assert_eq!(table.rows_where("adset_name", "Alpha"), None);
        assert_eq!(table.distinct("campaign_name"), vec!["Alpha", "Beta"]);
        assert!(table.distinct("platform").is_empty());
    }

    #[test]
    fn test_loader_fingerprints_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ads.csv");
        fs::write(&path, "date,roas\n2024-01-01,2.0\n").unwrap();

        let table = DataLoader::new(&path).load().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.digest().map(str::len), Some(64));
    }

    #[test]
    fn test_loader_missing_file() {
        let err = DataLoader::new("/nonexistent/ads.csv").load().unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
