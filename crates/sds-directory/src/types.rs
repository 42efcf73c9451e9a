use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// One directory entry as returned by a search.
///
/// Only the attributes requested by the search are populated. The sync
/// never holds an entry past the operation that fetched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Distinguished name; the identity handle for `modify`.
    pub dn: String,
    pub attrs: BTreeMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Builder-style single-valued attribute, mostly for fixtures.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), vec![value.into()]);
        self
    }

    /// All values of `name`. LDAP attribute names are case-insensitive, and
    /// servers do not always echo the requested casing.
    pub fn values(&self, name: &str) -> &[String] {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Delta
// ---------------------------------------------------------------------------

/// Attribute name -> replacement values, applied as a full replace of each
/// named attribute. Ordered so log lines and test assertions are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeDelta(BTreeMap<String, Vec<String>>);

impl AttributeDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to the single value `value`, replacing any earlier setting.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), vec![value.into()]);
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    /// Convenience for single-valued attributes.
    pub fn get_single(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// `(attribute=value)` equality match, the only filter shape the sync uses.
///
/// The value is kept raw; escaping happens when the filter is rendered, so a
/// roster cell like `o'neil(2)@example.edu.vn` cannot alter the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualityFilter {
    pub attribute: String,
    pub value: String,
}

impl EqualityFilter {
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// RFC 4515 string form with the assertion value escaped.
    pub fn to_ldap_filter(&self) -> String {
        format!("({}={})", self.attribute, ldap3::ldap_escape(self.value.as_str()))
    }

    /// `true` when `entry` satisfies this filter. Used by in-memory
    /// directories, so it follows Active Directory's matching for `mail` and
    /// `company`: attribute name and value are both compared ASCII
    /// case-insensitively.
    pub fn matches(&self, entry: &DirectoryEntry) -> bool {
        entry
            .values(&self.attribute)
            .iter()
            .any(|v| v.eq_ignore_ascii_case(&self.value))
    }
}

impl fmt::Display for EqualityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ldap_filter())
    }
}
