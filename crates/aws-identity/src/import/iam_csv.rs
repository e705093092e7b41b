//! Parser for the credentials CSV downloaded from the IAM Management
//! Console.
//!
//! The first line is a header and is discarded. Every other line maps its
//! first three comma-separated columns to `name`, `access_key_id` and
//! `secret_access_key`; further columns are ignored.

use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use log::debug;

use super::IdentityParser;
use crate::error::{IdentityError, Result};
use crate::identity::IdentityFields;

/// Number of leading columns an IAM row must carry.
const REQUIRED_COLUMNS: usize = 3;

/// Parser for IAM console credential CSV files.
#[derive(Debug, Clone)]
pub struct IamCsvParser {
    path: PathBuf,
}

impl IamCsvParser {
    /// Create a parser for the file at `path`. Nothing is read until
    /// [`IdentityParser::parse`] is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this parser reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse CSV text already in memory.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::MalformedRow` for the first data row with
    /// fewer than three columns.
    pub fn parse_str(contents: &str) -> Result<Vec<IdentityFields>> {
        // Plain comma split: quotes are ordinary characters and rows may
        // carry any number of columns.
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .quoting(false)
            .from_reader(contents.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| IdentityError::MalformedRow {
                line: e.position().map_or(0, |p| p.line() as usize),
                reason: e.to_string(),
            })?;

            if record.iter().all(|column| column.trim().is_empty()) {
                continue;
            }

            if record.len() < REQUIRED_COLUMNS {
                return Err(IdentityError::MalformedRow {
                    line: record.position().map_or(0, |p| p.line() as usize),
                    reason: format!(
                        "expected at least {REQUIRED_COLUMNS} columns, found {}",
                        record.len()
                    ),
                });
            }

            rows.push(IdentityFields::new(&record[0], &record[1], &record[2]));
        }

        Ok(rows)
    }
}

impl IdentityParser for IamCsvParser {
    fn parse(&self) -> Result<Vec<IdentityFields>> {
        let contents = std::fs::read_to_string(&self.path)?;
        let rows = Self::parse_str(&contents)?;
        debug!("parsed {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}
