// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Parsing of directory exports for user synchronization.
//!
//! The export is a CSV file with the columns `primary_email`, `given_name`,
//! `family_name`, `suspended` and `creation_time`. Headers are matched
//! case-insensitively; spaces and dots count as underscores.

use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord, Trim};
use lms::DirectoryEntry;
use lms_domain::parse_date;
use thiserror::Error;
use time::Date;

use crate::error::ApiError;

/// Directory export errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryImportError {
    /// The file is not valid CSV.
    #[error("Failed to read directory export: {0}")]
    Malformed(String),

    /// Required columns are missing.
    #[error("Missing required headers: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),

    /// A row could not be parsed. Rows are numbered from 1, excluding the header.
    #[error("Row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

impl From<DirectoryImportError> for ApiError {
    fn from(err: DirectoryImportError) -> Self {
        Self::InvalidInput {
            field: String::from("csv"),
            message: err.to_string(),
        }
    }
}

const REQUIRED_HEADERS: &[&str] = &["primary_email", "given_name", "family_name", "suspended"];

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace([' ', '.'], "_")
}

fn map_headers(headers: &StringRecord) -> Result<HashMap<String, usize>, DirectoryImportError> {
    let header_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| (normalize_header(header), idx))
        .collect();

    let missing: Vec<String> = REQUIRED_HEADERS
        .iter()
        .filter(|required| !header_map.contains_key(**required))
        .map(|required| (*required).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DirectoryImportError::MissingHeaders(missing));
    }
    Ok(header_map)
}

fn parse_suspended(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "" | "false" | "no" | "0" => Some(false),
        "true" | "yes" | "1" => Some(true),
        _ => None,
    }
}

/// Reads the date part of a timestamp such as `2024-03-01T09:30:00.000Z`.
fn parse_creation_time(value: &str) -> Result<Option<Date>, String> {
    if value.is_empty() {
        return Ok(None);
    }
    let date_part: &str = value.split(['T', ' ']).next().unwrap_or(value);
    parse_date(date_part)
        .map(Some)
        .map_err(|err| format!("creation_time: {err}"))
}

fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> Result<DirectoryEntry, String> {
    let get_field = |name: &str| -> String {
        header_map
            .get(name)
            .and_then(|&idx| record.get(idx))
            .unwrap_or_default()
            .to_string()
    };

    let primary_email: String = get_field("primary_email");
    if primary_email.is_empty() {
        return Err(String::from("primary_email: required field is missing or empty"));
    }
    let suspended_raw: String = get_field("suspended");
    let suspended: bool = parse_suspended(&suspended_raw)
        .ok_or_else(|| format!("suspended: invalid value '{suspended_raw}'"))?;

    Ok(DirectoryEntry {
        primary_email,
        given_name: get_field("given_name"),
        family_name: get_field("family_name"),
        suspended,
        created_on: parse_creation_time(&get_field("creation_time"))?,
    })
}

/// Parses a directory export.
///
/// # Errors
///
/// Fails on malformed CSV, missing headers, or the first row that cannot be
/// parsed. Nothing is returned for a partially valid file.
pub fn parse_directory_csv(content: &str) -> Result<Vec<DirectoryEntry>, DirectoryImportError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers: StringRecord = reader
        .headers()
        .map_err(|err| DirectoryImportError::Malformed(err.to_string()))?
        .clone();
    let header_map: HashMap<String, usize> = map_headers(&headers)?;

    let mut entries: Vec<DirectoryEntry> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record: StringRecord =
            record.map_err(|err| DirectoryImportError::Malformed(err.to_string()))?;
        let entry: DirectoryEntry = parse_row(&record, &header_map)
            .map_err(|reason| DirectoryImportError::InvalidRow {
                row: idx + 1,
                reason,
            })?;
        entries.push(entry);
    }
    Ok(entries)
}
