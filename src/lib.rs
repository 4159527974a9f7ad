mod cache;
mod cleaning;
mod config;
mod correlation;
mod filter;
mod paging;
mod session;
mod stats;
mod tui;
mod types;

use serde::Serialize;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

pub use cache::DatasetCache;
pub use cleaning::{ExtractionPattern, ExtractionRule, NormalizeRules, normalize};
pub use config::DashboardConfig;
pub use correlation::{CorrelationMatrix, correlate};
pub use filter::{FilterSpec, apply_filters, brand_options, first_token};
pub use paging::{page_count, paginate};
pub use session::{Selection, Session};
pub use stats::{GroupedSeries, count, group_count, group_mean, mean, mode, mode_with};
pub use tui::render_tui;
pub use types::{ColumnType, Value, infer_type};

#[derive(Debug, Error)]
pub enum DashError {
    #[error("Required column '{0}' is missing from the dataset")]
    Schema(String),
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),
    #[error("Invalid extraction pattern for column '{column}': {source}")]
    InvalidPattern {
        column: String,
        #[source]
        source: regex::Error,
    },
    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DashError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Schema(_) => "SCHEMA",
            Self::UnknownColumn(_) => "UNKNOWN_COLUMN",
            Self::InvalidPattern { .. } => "INVALID_PATTERN",
            Self::RaggedRow { .. } => "RAGGED_ROW",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Csv(_) => "CSV",
            Self::Io(_) => "IO",
            Self::Json(_) => "JSON",
        }
    }
}

pub type Result<T> = std::result::Result<T, DashError>;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let ragged = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != headers.len());
        if let Some((row, cells)) = ragged {
            return Err(DashError::RaggedRow {
                row,
                expected: headers.len(),
                found: cells.len(),
            });
        }
        Ok(Table { headers, rows })
    }

    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let table = Self::from_reader(std::fs::File::open(path)?)?;
        info!(
            "Loaded {} rows x {} columns from {}",
            table.row_count(),
            table.headers.len(),
            path.display()
        );
        Ok(table)
    }

    /// A column loads as numbers only when every non-missing cell parses.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
        let raw: Vec<csv::StringRecord> = rdr.records().collect::<std::result::Result<_, _>>()?;

        let numeric: Vec<bool> = (0..headers.len())
            .map(|col_idx| types::is_numeric_column(raw.iter().map(|r| &r[col_idx])))
            .collect();

        let rows = raw
            .iter()
            .map(|record| {
                record
                    .iter()
                    .zip(&numeric)
                    .map(|(cell, &is_num)| match types::parse_number(cell) {
                        Some(n) if is_num => Value::Number(n),
                        _ => Value::from_raw(cell),
                    })
                    .collect()
            })
            .collect();

        debug!(
            "Numeric columns: {:?}",
            headers
                .iter()
                .zip(&numeric)
                .filter(|(_, n)| **n)
                .map(|(h, _)| h.as_str())
                .collect::<Vec<_>>()
        );
        Ok(Table { headers, rows })
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|v| v.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.write_csv(std::fs::File::create(path)?)?;
        info!("Exported {} rows to {}", self.row_count(), path.display());
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| DashError::UnknownColumn(name.to_string()))
    }

    pub fn column_values<'a>(
        &'a self,
        name: &str,
    ) -> Result<impl Iterator<Item = &'a Value> + use<'a>> {
        let col_idx = self.require_column(name)?;
        Ok(self.rows.iter().map(move |row| &row[col_idx]))
    }

    pub fn column_type(&self, col_idx: usize) -> ColumnType {
        infer_type(self.rows.iter().map(|row| &row[col_idx]))
    }

    pub fn distinct_values(&self, name: &str) -> Result<Vec<Value>> {
        let mut seen = std::collections::HashSet::new();
        Ok(self
            .column_values(name)?
            .filter(|v| !v.is_missing() && seen.insert(*v))
            .cloned()
            .collect())
    }

    pub(crate) fn with_rows(&self, rows: Vec<Vec<Value>>) -> Table {
        Table {
            headers: self.headers.clone(),
            rows,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total_listings: usize,
    pub average_price: Option<f64>,
    pub most_common_brand: Option<Value>,
    pub popular_fuel: Option<Value>,
    pub transmission_mode: Option<Value>,
    /// `None` when the owner column is absent or has no values.
    pub ownership_mode: Option<Value>,
    pub price_by_fuel: GroupedSeries<Option<f64>>,
    pub transmission_split: GroupedSeries<usize>,
    pub year_distribution: Option<GroupedSeries<usize>>,
    pub correlation: CorrelationMatrix,
}

pub fn summarize(filtered: &Table, config: &DashboardConfig) -> Result<Summary> {
    for required in [
        &config.anchor_column,
        &config.name_column,
        &config.fuel_column,
        &config.transmission_column,
    ] {
        if filtered.column_index(required).is_none() {
            return Err(DashError::Schema(required.clone()));
        }
    }

    let ownership_mode = match filtered.column_index(&config.owner_column) {
        Some(_) => mode(filtered, &config.owner_column)?,
        None => None,
    };
    let year_distribution = match filtered.column_index(&config.year_column) {
        Some(_) => Some(group_count(filtered, &config.year_column, true)?),
        None => None,
    };

    Ok(Summary {
        total_listings: count(filtered),
        average_price: mean(filtered, &config.anchor_column)?,
        most_common_brand: mode_with(filtered, &config.name_column, first_token)?,
        popular_fuel: mode(filtered, &config.fuel_column)?,
        transmission_mode: mode(filtered, &config.transmission_column)?,
        ownership_mode,
        price_by_fuel: group_mean(filtered, &config.fuel_column, &config.anchor_column)?,
        transmission_split: group_count(filtered, &config.transmission_column, false)?,
        year_distribution,
        correlation: correlate(filtered).rounded(2),
    })
}
