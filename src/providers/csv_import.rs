//! Moxfield CSV collection export reader.
//!
//! Expected header (extra columns are ignored):
//! `Count,Tradelist Count,Name,Edition,Condition,Language,Foil,...`
//! `Count`, `Name` and `Edition` are required. A `Foil` value of `foil` or
//! `etched` moves the row's copies to the foil count.

use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::OwnedCard;
use crate::error::{Result, ScoutError};
use crate::providers::CollectionSource;

const REQUIRED_COLUMNS: [&str; 3] = ["Count", "Name", "Edition"];
const FOIL_VALUES: [&str; 2] = ["foil", "etched"];

struct Columns {
    count: usize,
    name: usize,
    edition: usize,
    foil: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == wanted)
        };

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| find(*c).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ScoutError::Import {
                line: 1,
                message: format!("Missing required columns: {}", missing.join(", ")),
            });
        }

        Ok(Self {
            count: find("Count").unwrap_or_default(),
            name: find("Name").unwrap_or_default(),
            edition: find("Edition").unwrap_or_default(),
            foil: find("Foil"),
        })
    }
}

/// Reads a Moxfield CSV export into collection rows
#[derive(Debug, Clone)]
pub struct MoxfieldCsvImporter {
    path: PathBuf,
}

impl MoxfieldCsvImporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the whole file
    pub fn parse_file(&self) -> Result<Vec<OwnedCard>> {
        let is_csv = self
            .path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if !is_csv {
            return Err(ScoutError::InvalidInput(format!(
                "Unsupported file format: {} (expected .csv)",
                self.path.display()
            )));
        }
        if !self.path.exists() {
            return Err(ScoutError::NotFound(format!("File not found: {}", self.path.display())));
        }

        let file = std::fs::File::open(&self.path)?;
        let cards = parse_reader(file)?;
        info!("Parsed {} rows from {}", cards.len(), self.path.display());
        Ok(cards)
    }

    /// Check the file without importing it; returns the number of valid rows
    pub fn validate(&self) -> Result<usize> {
        self.parse_file().map(|cards| cards.len())
    }
}

/// Parse CSV content. Errors carry the 1-based file line (header is line 1).
pub fn parse_reader<R: Read>(reader: R) -> Result<Vec<OwnedCard>> {
    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::from_headers(csv_reader.headers()?)?;
    let mut cards = Vec::new();

    for (index, record) in csv_reader.records().enumerate() {
        let fallback_line = index + 2;
        let record = record.map_err(|e| ScoutError::Import {
            line: e
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(fallback_line),
            message: format!("CSV parsing error: {}", e),
        })?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);

        cards.push(parse_row(&record, &columns, line)?);
    }

    if cards.is_empty() {
        return Err(ScoutError::Import {
            line: 1,
            message: "No valid items found in CSV file".to_string(),
        });
    }

    Ok(cards)
}

fn parse_row(record: &StringRecord, columns: &Columns, line: usize) -> Result<OwnedCard> {
    let field = |idx: usize| record.get(idx).unwrap_or("").trim();
    let invalid = |message: String| ScoutError::Import { line, message };

    let count_raw = field(columns.count);
    if count_raw.is_empty() {
        return Err(invalid("Count field cannot be empty".to_string()));
    }
    let count: u32 = count_raw
        .parse::<i64>()
        .map_err(|_| invalid(format!("Count must be a valid integer, got: '{}'", count_raw)))
        .and_then(|n| {
            if n <= 0 {
                return Err(invalid(format!("Count must be positive, got: {}", n)));
            }
            u32::try_from(n).map_err(|_| invalid(format!("Count too large: {}", n)))
        })?;

    let name = field(columns.name);
    if name.is_empty() {
        return Err(invalid("Name field cannot be empty".to_string()));
    }
    if field(columns.edition).is_empty() {
        return Err(invalid("Edition field cannot be empty".to_string()));
    }

    let is_foil = columns
        .foil
        .map(|idx| {
            let value = field(idx).to_lowercase();
            FOIL_VALUES.contains(&value.as_str())
        })
        .unwrap_or(false);

    debug!(line, card = name, count, is_foil, "csv row");

    Ok(if is_foil {
        OwnedCard::new(name, 0, count)
    } else {
        OwnedCard::new(name, count, 0)
    })
}

#[async_trait]
impl CollectionSource for MoxfieldCsvImporter {
    /// The export already belongs to `user`; the file is read as-is
    async fn fetch_collection(&self, _user: &str) -> Result<Vec<OwnedCard>> {
        let importer = self.clone();
        tokio::task::spawn_blocking(move || importer.parse_file())
            .await
            .map_err(|e| ScoutError::Other(format!("CSV import task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        "moxfield_csv"
    }
}
