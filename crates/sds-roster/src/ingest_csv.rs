//! CSV ingestion for the student roster export.
//!
//! ## Column contract (header names matched case-insensitively, order-independent)
//!
//! | Column                | Example                    |
//! |-----------------------|----------------------------|
//! | `Pupil Email Address` | `an.nguyen@example.edu.vn` |
//! | `School Code`         | `S001234`                  |
//! | `School Id`           | `1234`                     |
//! | `Boarding House`      | `Nam Long`                 |
//! | `Year Code`           | `NLY10`                    |
//! | `Form`                | `NL-9A`                    |
//!
//! Extra columns are ignored. Cells are trimmed. A row shorter than the
//! header yields empty strings for the missing cells; the rule engine treats
//! those like any other unmatched value.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::StudentRecord;

const COL_EMAIL: &str = "Pupil Email Address";
const COL_SCHOOL_CODE: &str = "School Code";
const COL_SCHOOL_ID: &str = "School Id";
const COL_BOARDING_HOUSE: &str = "Boarding House";
const COL_YEAR_CODE: &str = "Year Code";
const COL_FORM: &str = "Form";

/// Header columns every roster file must carry.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    COL_EMAIL,
    COL_SCHOOL_CODE,
    COL_SCHOOL_ID,
    COL_BOARDING_HOUSE,
    COL_YEAR_CODE,
    COL_FORM,
];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum RosterError {
    /// The file could not be opened or read.
    Io(String),
    /// The header row is missing a required column.
    MissingHeader(String),
    /// The CSV reader rejected a record (bad quoting, invalid UTF-8, ...).
    Row { line: u64, message: String },
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterError::Io(msg) => write!(f, "roster io error: {msg}"),
            RosterError::MissingHeader(col) => {
                write!(f, "roster missing required header column: '{col}'")
            }
            RosterError::Row { line, message } => {
                write!(f, "roster line {line}: {message}")
            }
        }
    }
}

impl std::error::Error for RosterError {}

impl From<csv::Error> for RosterError {
    fn from(e: csv::Error) -> Self {
        let line = e.position().map(|p| p.line()).unwrap_or(0);
        RosterError::Row {
            line,
            message: e.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Read the roster file at `path`, preserving row order.
pub fn read_roster(path: &Path) -> Result<Vec<StudentRecord>, RosterError> {
    let bytes = std::fs::read(path)
        .map_err(|e| RosterError::Io(format!("read '{}': {e}", path.display())))?;
    parse_roster_bytes(&bytes)
}

/// Parse roster CSV from a string slice.
///
/// See [`read_roster`]; empty input yields an empty roster.
pub fn parse_roster_str(src: &str) -> Result<Vec<StudentRecord>, RosterError> {
    parse_roster_bytes(src.as_bytes())
}

fn parse_roster_bytes(bytes: &[u8]) -> Result<Vec<StudentRecord>, RosterError> {
    // Spreadsheet exports on Windows commonly prepend a BOM.
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    let cols = ColumnIndex::build(&headers)?;

    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        // A row of nothing but separators carries no student.
        if rec.iter().all(str::is_empty) {
            continue;
        }
        out.push(StudentRecord {
            email: cols.get(&rec, COL_EMAIL),
            school_code: cols.get(&rec, COL_SCHOOL_CODE),
            school_id: cols.get(&rec, COL_SCHOOL_ID),
            boarding_house: cols.get(&rec, COL_BOARDING_HOUSE),
            year_code: cols.get(&rec, COL_YEAR_CODE),
            form: cols.get(&rec, COL_FORM),
        });
    }

    Ok(out)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Case-insensitive column-name -> index map over the header row.
struct ColumnIndex(HashMap<String, usize>);

impl ColumnIndex {
    fn build(headers: &csv::StringRecord) -> Result<Self, RosterError> {
        let mut idx: HashMap<String, usize> = HashMap::new();
        for (i, col) in headers.iter().enumerate() {
            // First occurrence wins on duplicated header names.
            idx.entry(col.trim().to_ascii_lowercase()).or_insert(i);
        }

        for req in REQUIRED_COLUMNS {
            if !idx.contains_key(&req.to_ascii_lowercase()) {
                return Err(RosterError::MissingHeader(req.to_string()));
            }
        }

        Ok(Self(idx))
    }

    fn get(&self, rec: &csv::StringRecord, column: &str) -> String {
        self.0
            .get(&column.to_ascii_lowercase())
            .and_then(|&i| rec.get(i))
            .unwrap_or("")
            .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
