//! Test fixtures shared by the sync scenarios.
//!
//! No network, no clock. Everything here is deterministic.

mod fake_directory;

pub use fake_directory::{FakeDirectory, ModifyCall, SearchCall};

use sds_roster::StudentRecord;

/// A roster row with fixed school code / id, for scenarios that only care
/// about the email, boarding house, year code and form.
pub fn student(email: &str, boarding_house: &str, year_code: &str, form: &str) -> StudentRecord {
    StudentRecord::new(email, "S001", "1001", boarding_house, year_code, form)
}
