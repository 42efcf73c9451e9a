use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use sds_directory::{AttributeDelta, DirectoryEntry, DirectoryError, DirectoryGateway, EqualityFilter};

/// LDAP result code for a write against an unknown DN.
const RC_NO_SUCH_OBJECT: u32 = 32;
/// LDAP result code used by [`FakeDirectory::reject_attribute`].
const RC_CONSTRAINT_VIOLATION: u32 = 19;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCall {
    pub filter: EqualityFilter,
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyCall {
    pub dn: String,
    pub delta: AttributeDelta,
}

/// In-memory directory.
///
/// Entries are returned in insertion order. Filter values match ASCII
/// case-insensitively, as Active Directory does for `mail` and `company`.
/// Accepted modifies are applied to the stored entries so scenarios can
/// assert on end state. Every call is recorded, accepted or not.
#[derive(Default)]
pub struct FakeDirectory {
    entries: Vec<DirectoryEntry>,
    searches: Vec<SearchCall>,
    modifies: Vec<ModifyCall>,
    rejected_dns: BTreeMap<String, (u32, String)>,
    rejected_searches: BTreeMap<String, (u32, String)>,
    rejected_attributes: BTreeSet<String>,
    /// Remaining calls before the transport "drops".
    calls_before_loss: Option<usize>,
    disconnected: bool,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, entry: DirectoryEntry) -> &mut Self {
        self.entries.push(entry);
        self
    }

    /// Student account with `mail` and `distinguishedName` set.
    pub fn add_student(&mut self, dn: &str, mail: &str) -> &mut Self {
        self.add_entry(
            DirectoryEntry::new(dn)
                .with_attr("distinguishedName", dn)
                .with_attr("mail", mail),
        )
    }

    /// Student account already filed under `company`.
    pub fn add_student_in(&mut self, dn: &str, mail: &str, company: &str) -> &mut Self {
        self.add_entry(
            DirectoryEntry::new(dn)
                .with_attr("distinguishedName", dn)
                .with_attr("mail", mail)
                .with_attr("company", company),
        )
    }

    /// Every modify against `dn` is answered with `rc`.
    pub fn reject_modify_on(&mut self, dn: &str, rc: u32, text: &str) -> &mut Self {
        self.rejected_dns
            .insert(dn.to_string(), (rc, text.to_string()));
        self
    }

    /// Every search whose filter value equals `value` (any attribute) is
    /// answered with `rc`. The connection stays usable.
    pub fn reject_search_for(&mut self, value: &str, rc: u32, text: &str) -> &mut Self {
        self.rejected_searches
            .insert(value.to_string(), (rc, text.to_string()));
        self
    }

    /// Any modify that touches `attribute` is answered with a constraint
    /// violation.
    pub fn reject_attribute(&mut self, attribute: &str) -> &mut Self {
        self.rejected_attributes.insert(attribute.to_string());
        self
    }

    /// The first `n` calls succeed normally; every call after that fails
    /// with [`DirectoryError::ConnectionLost`].
    pub fn lose_connection_after(&mut self, n: usize) -> &mut Self {
        self.calls_before_loss = Some(n);
        self
    }

    pub fn searches(&self) -> &[SearchCall] {
        &self.searches
    }

    pub fn search_count(&self) -> usize {
        self.searches.len()
    }

    pub fn modifies(&self) -> &[ModifyCall] {
        &self.modifies
    }

    pub fn modify_count(&self) -> usize {
        self.modifies.len()
    }

    pub fn modifies_for(&self, dn: &str) -> Vec<&ModifyCall> {
        self.modifies.iter().filter(|m| m.dn == dn).collect()
    }

    pub fn entry(&self, dn: &str) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|e| e.dn == dn)
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    fn check_transport(&mut self) -> Result<(), DirectoryError> {
        if self.disconnected {
            return Err(DirectoryError::ConnectionLost(
                "session already closed".to_string(),
            ));
        }
        match self.calls_before_loss.as_mut() {
            Some(0) => Err(DirectoryError::ConnectionLost(
                "connection reset by peer".to_string(),
            )),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

fn project(entry: &DirectoryEntry, attributes: &[&str]) -> DirectoryEntry {
    let mut out = DirectoryEntry::new(entry.dn.as_str());
    for (name, values) in &entry.attrs {
        if attributes.iter().any(|a| a.eq_ignore_ascii_case(name)) {
            out.attrs.insert(name.clone(), values.clone());
        }
    }
    out
}

#[async_trait]
impl DirectoryGateway for FakeDirectory {
    async fn search(
        &mut self,
        filter: &EqualityFilter,
        attributes: &[&str],
    ) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        self.check_transport()?;
        self.searches.push(SearchCall {
            filter: filter.clone(),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        });

        if let Some((rc, text)) = self.rejected_searches.get(&filter.value) {
            return Err(DirectoryError::Rejected {
                rc: *rc,
                text: text.clone(),
            });
        }

        Ok(self
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .map(|e| project(e, attributes))
            .collect())
    }

    async fn modify(&mut self, dn: &str, delta: &AttributeDelta) -> Result<(), DirectoryError> {
        self.check_transport()?;
        self.modifies.push(ModifyCall {
            dn: dn.to_string(),
            delta: delta.clone(),
        });

        if let Some((rc, text)) = self.rejected_dns.get(dn) {
            return Err(DirectoryError::Rejected {
                rc: *rc,
                text: text.clone(),
            });
        }
        if let Some(attr) = delta.names().find(|n| self.rejected_attributes.contains(*n)) {
            return Err(DirectoryError::Rejected {
                rc: RC_CONSTRAINT_VIOLATION,
                text: format!("constraint violation on {attr}"),
            });
        }

        let Some(entry) = self.entries.iter_mut().find(|e| e.dn == dn) else {
            return Err(DirectoryError::Rejected {
                rc: RC_NO_SUCH_OBJECT,
                text: format!("no such object: {dn}"),
            });
        };
        for (name, values) in delta.iter() {
            entry.attrs.retain(|k, _| !k.eq_ignore_ascii_case(name));
            entry.attrs.insert(name.to_string(), values.to_vec());
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), DirectoryError> {
        self.disconnected = true;
        Ok(())
    }
}
