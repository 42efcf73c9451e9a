//! sds-roster
//!
//! Read side of the student roster export: CSV text in, ordered
//! [`StudentRecord`] values out. No directory access and no attribute rules
//! live here.

mod ingest_csv;
mod record;

pub use ingest_csv::{parse_roster_str, read_roster, RosterError, REQUIRED_COLUMNS};
pub use record::StudentRecord;
