//! Attribute rules.
//!
//! Pure functions of ([`RuleSet`], [`StudentRecord`]). No IO.

use std::collections::BTreeSet;

use anyhow::{bail, Context, Result};
use sds_directory::AttributeDelta;
use sds_roster::StudentRecord;
use serde::Deserialize;
use serde_json::Value;

pub const ATTR_EMPLOYEE_ID: &str = "employeeID";
pub const ATTR_EMPLOYEE_NUMBER: &str = "employeeNumber";
pub const ATTR_TITLE: &str = "title";
pub const ATTR_OFFICE: &str = "physicalDeliveryOfficeName";
pub const ATTR_COMPANY: &str = "company";
pub const ATTR_DEPARTMENT: &str = "department";
pub const ATTR_DESCRIPTION: &str = "description";

fn default_title() -> String {
    "Student".to_string()
}

/// One campus / boarding-house category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Category {
    /// Value of the roster's `Boarding House` column, matched exactly.
    pub name: String,
    /// Written to `physicalDeliveryOfficeName`.
    pub office: String,
    /// Written to `company`; also the key for directory-side statistics.
    pub company: String,
    /// `Year Code` prefixes stripped into `"Year <rest>"`, e.g. `NLY`.
    #[serde(default)]
    pub year_prefixes: Vec<String>,
    /// `Form` prefixes stripped into the homeroom description, e.g. `NL-`.
    #[serde(default)]
    pub form_prefixes: Vec<String>,
}

/// The rule table. Adding a campus is a config change, not a code change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSet {
    #[serde(default = "default_title")]
    pub title: String,
    /// Term printed into the homeroom description, e.g. `"24-25"`.
    pub term_label: String,
    pub categories: Vec<Category>,
}

/// The three independent write groups, in the order they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleGroup {
    Common,
    BoardingHouse,
    DepartmentDescription,
}

impl RuleGroup {
    pub const ALL: [RuleGroup; 3] = [
        RuleGroup::Common,
        RuleGroup::BoardingHouse,
        RuleGroup::DepartmentDescription,
    ];

    /// Human label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            RuleGroup::Common => "basic attributes",
            RuleGroup::BoardingHouse => "boarding house attributes",
            RuleGroup::DepartmentDescription => "department/description",
        }
    }
}

impl RuleSet {
    /// Build from the `/rules` subtree of the effective config and validate.
    pub fn from_config_json(config_json: &Value) -> Result<Self> {
        let raw = config_json
            .pointer("/rules")
            .cloned()
            .context("RULES_INVALID: config has no /rules section")?;
        let rules: RuleSet =
            serde_json::from_value(raw).context("RULES_INVALID: /rules has the wrong shape")?;
        rules.validate()?;
        Ok(rules)
    }

    /// Replace the term label (CLI `--term`).
    pub fn with_term_label(mut self, term_label: impl Into<String>) -> Result<Self> {
        self.term_label = term_label.into();
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            bail!("RULES_INVALID: title must not be blank");
        }
        if self.term_label.trim().is_empty() {
            bail!("RULES_INVALID: term_label must not be blank");
        }
        if self.categories.is_empty() {
            bail!("RULES_INVALID: at least one category is required");
        }

        let mut names = BTreeSet::new();
        for c in &self.categories {
            if c.name.trim().is_empty() || c.office.trim().is_empty() || c.company.trim().is_empty()
            {
                bail!(
                    "RULES_INVALID: category '{}' needs non-blank name, office and company",
                    c.name
                );
            }
            if !names.insert(c.name.as_str()) {
                bail!("RULES_INVALID: duplicate category name '{}'", c.name);
            }
            if c.year_prefixes.iter().chain(&c.form_prefixes).any(|p| p.is_empty()) {
                bail!("RULES_INVALID: category '{}' has an empty prefix", c.name);
            }
        }
        Ok(())
    }

    /// Category whose name equals `boarding_house` exactly.
    pub fn category(&self, boarding_house: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == boarding_house)
    }

    /// Delta for one rule group.
    pub fn delta_for(&self, group: RuleGroup, record: &StudentRecord) -> AttributeDelta {
        match group {
            RuleGroup::Common => self.common_attributes(record),
            RuleGroup::BoardingHouse => self.boarding_house_attributes(record),
            RuleGroup::DepartmentDescription => self.department_and_description_attributes(record),
        }
    }

    /// Always exactly `employeeID`, `employeeNumber` and `title`.
    pub fn common_attributes(&self, record: &StudentRecord) -> AttributeDelta {
        let mut d = AttributeDelta::new();
        d.set(ATTR_EMPLOYEE_ID, record.school_code.as_str());
        d.set(ATTR_EMPLOYEE_NUMBER, record.school_id.as_str());
        d.set(ATTR_TITLE, self.title.as_str());
        d
    }

    /// Office and company for a known boarding house; empty otherwise.
    pub fn boarding_house_attributes(&self, record: &StudentRecord) -> AttributeDelta {
        let mut d = AttributeDelta::new();
        if let Some(c) = self.category(&record.boarding_house) {
            d.set(ATTR_OFFICE, c.office.as_str());
            d.set(ATTR_COMPANY, c.company.as_str());
        }
        d
    }

    /// `department` is always present. `description` only when the form
    /// carries a known site prefix; otherwise the key is left out so the
    /// existing value is untouched.
    ///
    /// Prefixes are matched against the whole table, not the row's own
    /// boarding house: a Van Phuc boarder in a Nam Long homeroom still gets
    /// a description.
    pub fn department_and_description_attributes(&self, record: &StudentRecord) -> AttributeDelta {
        let mut d = AttributeDelta::new();

        let department = match strip_any(&record.year_code, self.year_prefixes()) {
            Some(rest) => format!("Year {rest}"),
            None => record.year_code.clone(),
        };
        d.set(ATTR_DEPARTMENT, department);

        if let Some(rest) = strip_any(&record.form, self.form_prefixes()) {
            d.set(ATTR_DESCRIPTION, format!("Year {} HR {rest}", self.term_label));
        }

        d
    }

    fn year_prefixes(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .flat_map(|c| c.year_prefixes.iter().map(String::as_str))
    }

    fn form_prefixes(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .flat_map(|c| c.form_prefixes.iter().map(String::as_str))
    }
}

fn strip_any<'s, 'p>(s: &'s str, mut prefixes: impl Iterator<Item = &'p str>) -> Option<&'s str> {
    prefixes.find_map(|p| s.strip_prefix(p))
}
