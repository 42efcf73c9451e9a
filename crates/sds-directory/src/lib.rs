//! sds-directory
//!
//! Directory boundary for the student sync.
//!
//! The sync core only ever needs two primitives: find entries where one
//! attribute equals one value, and replace a set of attributes on one DN.
//! [`DirectoryGateway`] is that contract; [`LdapGateway`] implements it over
//! LDAP v3 (Active Directory included) using `ldap3`.

mod error;
mod gateway;
mod ldap;
mod types;

pub use error::DirectoryError;
pub use gateway::DirectoryGateway;
pub use ldap::LdapGateway;
pub use types::{AttributeDelta, DirectoryEntry, EqualityFilter};
