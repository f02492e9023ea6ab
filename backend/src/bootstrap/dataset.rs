//! Processed team dataset
//!
//! A CSV table with one row per employee. Every column is optional; the
//! real-data bootstrapper looks for the ones it understands (`team_id` or
//! `team`, `tenure_months`, `level`, `skill_score`, the `*_score` metrics,
//! `role`, `manager_id`/`employee_id` and network-derived columns) and
//! ignores the rest except as extra numeric features.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read dataset {origin}: {detail}")]
    Parse { origin: String, detail: String },
}

/// In-memory dataset: header plus string cells
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Read a CSV file; a missing file is [`DatasetError::NotFound`]
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        if !path.is_file() {
            return Err(DatasetError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|e| DatasetError::Parse {
            origin: path.display().to_string(),
            detail: e.to_string(),
        })?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset")
            .to_string();
        Self::from_csv_str(&contents, name)
    }

    /// Parse CSV text with a header row
    pub fn from_csv_str(contents: &str, name: impl Into<String>) -> Result<Self, DatasetError> {
        let name = name.into();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(contents.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| DatasetError::Parse {
                origin: name.clone(),
                detail: e.to_string(),
            })?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| DatasetError::Parse {
                origin: name.clone(),
                detail: e.to_string(),
            })?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), i))
            .collect();

        Ok(Self {
            name,
            headers,
            index,
            rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Non-empty text cell (`NA`/`nan`/`null` count as empty)
    pub fn text(&self, row: usize, column: &str) -> Option<&str> {
        let col = *self.index.get(column)?;
        let cell = self.rows.get(row)?.get(col)?.as_str();
        if is_missing(cell) {
            None
        } else {
            Some(cell)
        }
    }

    /// Numeric cell; unparseable or missing cells are `None`
    pub fn number(&self, row: usize, column: &str) -> Option<f64> {
        self.text(row, column)
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// Columns whose non-missing cells all parse as numbers (at least one)
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|column| {
                let mut seen = false;
                for row in 0..self.rows.len() {
                    match self.text(row, column) {
                        Some(cell) if cell.parse::<f64>().is_ok() => seen = true,
                        Some(_) => return false,
                        None => {}
                    }
                }
                seen
            })
            .map(String::as_str)
            .collect()
    }
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty()
        || cell.eq_ignore_ascii_case("na")
        || cell.eq_ignore_ascii_case("nan")
        || cell.eq_ignore_ascii_case("null")
}
