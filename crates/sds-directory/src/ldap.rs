//! LDAP v3 implementation of [`DirectoryGateway`].

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use ldap3::adapters::{Adapter, EntriesOnly, PagedResults};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, Mod, Scope, SearchEntry};
use sds_config::DirectoryCredentials;
use tracing::{debug, info, warn};

use crate::{AttributeDelta, DirectoryEntry, DirectoryError, DirectoryGateway, EqualityFilter};

/// LDAP result code for invalid credentials.
const RC_INVALID_CREDENTIALS: u32 = 49;

/// Page size for searches. Active Directory caps unpaged results at
/// MaxPageSize (1000 by default), which a single campus can exceed.
const SEARCH_PAGE_SIZE: i32 = 500;

/// A bound LDAP session scoped to one base DN.
pub struct LdapGateway {
    ldap: Ldap,
    base_dn: String,
}

impl LdapGateway {
    /// Open the connection, spawn its driver and perform a simple bind.
    ///
    /// Any failure here is a startup failure: nothing has been read or
    /// written yet.
    pub async fn connect(creds: &DirectoryCredentials) -> Result<Self, DirectoryError> {
        debug!(url = %creds.url, starttls = creds.starttls, "connecting to directory");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(creds.connect_timeout_secs))
            .set_starttls(creds.starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &creds.url)
            .await
            .map_err(|e| DirectoryError::Connection(format!("{}: {e}", creds.url)))?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        debug!(bind_dn = %creds.bind_dn, "performing LDAP bind");

        let result = ldap
            .simple_bind(&creds.bind_dn, &creds.bind_password)
            .await
            .map_err(|e| DirectoryError::Connection(format!("bind as {}: {e}", creds.bind_dn)))?;

        check_bind(result.rc, result.text, &creds.bind_dn)?;

        info!(url = %creds.url, base_dn = %creds.base_dn, "connected to directory");

        Ok(Self {
            ldap,
            base_dn: creds.base_dn.clone(),
        })
    }

    fn entry_from_search(entry: SearchEntry) -> DirectoryEntry {
        DirectoryEntry {
            dn: entry.dn,
            attrs: entry.attrs.into_iter().collect::<BTreeMap<_, _>>(),
        }
    }
}

/// Split an `ldap3` failure into "server said no" and "transport is gone".
fn classify(e: LdapError) -> DirectoryError {
    match e {
        LdapError::LdapResult { result } => DirectoryError::Rejected {
            rc: result.rc,
            text: result.text,
        },
        other => DirectoryError::ConnectionLost(other.to_string()),
    }
}

/// A completed operation with a non-zero result code is a rejection of that
/// operation only.
fn check_rc(rc: u32, text: String) -> Result<(), DirectoryError> {
    if rc == 0 {
        Ok(())
    } else {
        Err(DirectoryError::Rejected { rc, text })
    }
}

/// Bad credentials are reported apart from every other bind refusal.
fn check_bind(rc: u32, text: String, bind_dn: &str) -> Result<(), DirectoryError> {
    match rc {
        0 => Ok(()),
        RC_INVALID_CREDENTIALS => Err(DirectoryError::Authentication(format!(
            "bind as {bind_dn} refused: {text}"
        ))),
        _ => Err(DirectoryError::Connection(format!(
            "bind as {bind_dn} failed with code {rc}: {text}"
        ))),
    }
}

#[async_trait]
impl DirectoryGateway for LdapGateway {
    async fn search(
        &mut self,
        filter: &EqualityFilter,
        attributes: &[&str],
    ) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        let ldap_filter = filter.to_ldap_filter();
        debug!(filter = %ldap_filter, base_dn = %self.base_dn, "searching directory");

        let adapters: Vec<Box<dyn Adapter<_, _>>> = vec![
            Box::new(EntriesOnly::new()),
            Box::new(PagedResults::new(SEARCH_PAGE_SIZE)),
        ];
        let mut stream = self
            .ldap
            .streaming_search_with(
                adapters,
                &self.base_dn,
                Scope::Subtree,
                &ldap_filter,
                attributes.to_vec(),
            )
            .await
            .map_err(classify)?;

        let mut out = Vec::new();
        while let Some(entry) = stream.next().await.map_err(classify)? {
            out.push(Self::entry_from_search(SearchEntry::construct(entry)));
        }
        stream.finish().await.success().map_err(classify)?;

        Ok(out)
    }

    async fn modify(&mut self, dn: &str, delta: &AttributeDelta) -> Result<(), DirectoryError> {
        let mods: Vec<Mod<String>> = delta
            .iter()
            .map(|(name, values)| {
                Mod::Replace(
                    name.to_string(),
                    values.iter().cloned().collect::<HashSet<String>>(),
                )
            })
            .collect();

        if mods.is_empty() {
            return Ok(());
        }

        debug!(dn = %dn, attributes = mods.len(), "modifying directory entry");

        let result = self.ldap.modify(dn, mods).await.map_err(classify)?;
        check_rc(result.rc, result.text)
    }

    async fn disconnect(&mut self) -> Result<(), DirectoryError> {
        self.ldap.unbind().await.map_err(classify)
    }
}
