/// One roster row. Immutable once read; the sync consumes it once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    /// `Pupil Email Address`. The only join key against the directory.
    pub email: String,
    /// `School Code`, written to `employeeID`.
    pub school_code: String,
    /// `School Id`, written to `employeeNumber`.
    pub school_id: String,
    /// `Boarding House`, the campus category (e.g. `"Nam Long"`).
    pub boarding_house: String,
    /// `Year Code`, e.g. `"NLY10"`.
    pub year_code: String,
    /// `Form`, the homeroom, e.g. `"NL-9A"`.
    pub form: String,
}

impl StudentRecord {
    pub fn new(
        email: impl Into<String>,
        school_code: impl Into<String>,
        school_id: impl Into<String>,
        boarding_house: impl Into<String>,
        year_code: impl Into<String>,
        form: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            school_code: school_code.into(),
            school_id: school_id.into(),
            boarding_house: boarding_house.into(),
            year_code: year_code.into(),
            form: form.into(),
        }
    }

    /// `true` when the row has no usable join key.
    pub fn has_blank_email(&self) -> bool {
        self.email.trim().is_empty()
    }
}
