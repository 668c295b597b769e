// Cell parsing shared by the CSV and Excel readers.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::portal::*;

pub const RESULT_COLUMNS: [&str; 5] = [
    "region",
    "constituency_name",
    "party",
    "votes",
    "total_voters",
];

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Positions of the columns in a header row. Names are matched without case
/// and surrounding spaces.
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new<S: AsRef<str>>(header: &[S]) -> HeaderIndex {
        let positions = header
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_ref().trim().to_lowercase(), idx))
            .collect();
        HeaderIndex { positions }
    }

    pub fn optional(&self, column: &str) -> Option<usize> {
        self.positions.get(column).cloned()
    }

    pub fn required(&self, column: &str) -> PortalResult<usize> {
        self.optional(column).context(MissingColumnSnafu { column })
    }

    pub fn require_all(&self, columns: &[&str]) -> PortalResult<()> {
        for c in columns.iter() {
            self.required(c)?;
        }
        Ok(())
    }
}

fn cell<'a>(cells: &'a [String], idx: Option<usize>) -> Option<&'a str> {
    let s = cells.get(idx?)?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// An integer cell. Blank cells are missing. Excel writes integers as
/// floats, so a float without a fractional part is accepted too.
pub fn parse_int(lineno: usize, column: &str, value: Option<&str>) -> PortalResult<Option<i64>> {
    let s = match value {
        Some(s) => s,
        None => return Ok(None),
    };
    if let Ok(x) = s.parse::<i64>() {
        return Ok(Some(x));
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Ok(Some(f as i64)),
        _ => CellParseSnafu {
            lineno,
            column,
            value: s,
        }
        .fail(),
    }
}

pub fn parse_count(lineno: usize, column: &str, value: Option<&str>) -> PortalResult<Option<u64>> {
    match parse_int(lineno, column, value)? {
        Some(x) if x < 0 => CellParseSnafu {
            lineno,
            column,
            value: x.to_string(),
        }
        .fail(),
        x => Ok(x.map(|v| v as u64)),
    }
}

fn parse_timestamp(lineno: usize, value: Option<&str>) -> PortalResult<Option<DateTime<Utc>>> {
    match value {
        None => Ok(None),
        Some(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(ts) => Ok(Some(ts.with_timezone(&Utc))),
            Err(_) => CellParseSnafu {
                lineno,
                column: "timestamp",
                value: s,
            }
            .fail(),
        },
    }
}

fn parse_status(lineno: usize, value: Option<&str>) -> PortalResult<Option<CountingStatus>> {
    match value {
        None => Ok(None),
        Some(s) => match s.parse::<CountingStatus>() {
            Ok(status) => Ok(Some(status)),
            Err(_) => CellParseSnafu {
                lineno,
                column: "counting_status",
                value: s,
            }
            .fail(),
        },
    }
}

/// Reads one row of the results table.
///
/// Blank cells become missing values, which the cleaning stage drops. Cells
/// that cannot be parsed are an error.
pub fn raw_record_from_cells(
    header: &HeaderIndex,
    cells: &[String],
    lineno: usize,
) -> PortalResult<RawRecord> {
    let text = |column: &str| cell(cells, header.optional(column)).map(|s| s.to_string());
    let value = |column: &str| cell(cells, header.optional(column));
    Ok(RawRecord {
        region: text("region"),
        constituency_name: text("constituency_name"),
        party: text("party"),
        votes: parse_int(lineno, "votes", value("votes"))?,
        total_voters: parse_count(lineno, "total_voters", value("total_voters"))?,
        timestamp: parse_timestamp(lineno, value("timestamp"))?,
        counting_status: parse_status(lineno, value("counting_status"))?,
        counted_votes: parse_count(lineno, "counted_votes", value("counted_votes"))?,
    })
}
