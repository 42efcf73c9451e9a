//! Directory credential resolution.
//!
//! This module is the single place that reads credential env vars.
//!
//! # Contract
//! - Config YAML stores only env var NAMES (e.g. `"SDS_BIND_PASSWORD"`).
//! - At startup the CLI calls [`resolve_directory_credentials`] once and
//!   passes the result to the directory gateway constructor.
//! - `Debug` on [`DirectoryCredentials`] redacts the password.
//! - Error messages reference the env var NAME, never the value.

use anyhow::{bail, Result};
use serde_json::Value;

const DEFAULT_URL_VAR: &str = "SDS_LDAP_URL";
const DEFAULT_BASE_DN_VAR: &str = "SDS_BASE_DN";
const DEFAULT_BIND_DN_VAR: &str = "SDS_BIND_DN";
const DEFAULT_BIND_PASSWORD_VAR: &str = "SDS_BIND_PASSWORD";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Everything needed to open and bind one directory connection.
///
/// Built once at startup. **The password is redacted in `Debug` output.**
#[derive(Clone)]
pub struct DirectoryCredentials {
    /// `ldap://host[:port]` or `ldaps://host[:port]`.
    pub url: String,
    /// Search base for every query (subtree scope).
    pub base_dn: String,
    /// Bind identity, DN or `DOMAIN\user` form as the server accepts.
    pub bind_dn: String,
    pub bind_password: String,
    pub connect_timeout_secs: u64,
    /// Upgrade a plain `ldap://` connection with STARTTLS before binding.
    pub starttls: bool,
}

impl std::fmt::Debug for DirectoryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryCredentials")
            .field("url", &self.url)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &"<REDACTED>")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("starttls", &self.starttls)
            .finish()
    }
}

/// Env var names extracted from the config JSON.
struct CredentialEnvNames {
    url_var: String,
    base_dn_var: String,
    bind_dn_var: String,
    bind_password_var: String,
}

/// Read a non-empty string value at `pointer`. Blank counts as absent.
fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Resolve a named environment variable. Unset or blank gives `None`.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

fn parse_env_names(config_json: &Value) -> CredentialEnvNames {
    CredentialEnvNames {
        url_var: read_str_at(config_json, "/directory/url_env")
            .unwrap_or_else(|| DEFAULT_URL_VAR.to_string()),
        base_dn_var: read_str_at(config_json, "/directory/base_dn_env")
            .unwrap_or_else(|| DEFAULT_BASE_DN_VAR.to_string()),
        bind_dn_var: read_str_at(config_json, "/directory/bind_dn_env")
            .unwrap_or_else(|| DEFAULT_BIND_DN_VAR.to_string()),
        bind_password_var: read_str_at(config_json, "/directory/bind_password_env")
            .unwrap_or_else(|| DEFAULT_BIND_PASSWORD_VAR.to_string()),
    }
}

/// Resolve the directory connection settings.
///
/// `url` and `base_dn` may be given literally in config (`/directory/url`,
/// `/directory/base_dn`); the literal wins over the env var. The bind DN and
/// password only ever come from the environment.
///
/// # Errors
/// `SECRETS_MISSING` naming the first env var that is unset or empty, or
/// `CONFIG_INVALID` for a malformed scalar.
pub fn resolve_directory_credentials(config_json: &Value) -> Result<DirectoryCredentials> {
    let names = parse_env_names(config_json);

    let url = match read_str_at(config_json, "/directory/url") {
        Some(u) => u,
        None => require_env(&names.url_var, "directory url")?,
    };
    if !(url.starts_with("ldap://") || url.starts_with("ldaps://")) {
        bail!("CONFIG_INVALID: directory url must start with ldap:// or ldaps://");
    }

    let base_dn = match read_str_at(config_json, "/directory/base_dn") {
        Some(b) => b,
        None => require_env(&names.base_dn_var, "base DN")?,
    };

    let bind_dn = require_env(&names.bind_dn_var, "bind DN")?;
    let bind_password = require_env(&names.bind_password_var, "bind password")?;

    let connect_timeout_secs = match config_json.pointer("/directory/connect_timeout_secs") {
        None | Some(Value::Null) => DEFAULT_CONNECT_TIMEOUT_SECS,
        Some(v) => match v.as_u64() {
            Some(n) if n > 0 => n,
            _ => bail!("CONFIG_INVALID: /directory/connect_timeout_secs must be a positive integer"),
        },
    };

    let starttls = match config_json.pointer("/directory/starttls") {
        None | Some(Value::Null) => false,
        Some(v) => match v.as_bool() {
            Some(b) => b,
            None => bail!("CONFIG_INVALID: /directory/starttls must be true or false"),
        },
    };

    Ok(DirectoryCredentials {
        url,
        base_dn,
        bind_dn,
        bind_password,
        connect_timeout_secs,
        starttls,
    })
}

fn require_env(var_name: &str, what: &str) -> Result<String> {
    match resolve_env(var_name) {
        Some(v) => Ok(v),
        None => bail!(
            "SECRETS_MISSING: required env var '{}' ({}) is not set or empty",
            var_name,
            what,
        ),
    }
}
