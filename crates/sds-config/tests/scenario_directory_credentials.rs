//! Directory credential resolution from the environment.
//!
//! Each test points the config at its own env var names so tests can run in
//! parallel without racing on shared variables.

use sds_config::{load_layered_yaml_from_strings, resolve_directory_credentials, DEFAULT_CONFIG_YAML};
use serde_json::Value;

fn config_with_prefix(prefix: &str, extra: &str) -> Value {
    let overrides = format!(
        r#"
directory:
  url_env: "{prefix}_URL"
  base_dn_env: "{prefix}_BASE_DN"
  bind_dn_env: "{prefix}_BIND_DN"
  bind_password_env: "{prefix}_BIND_PASSWORD"
{extra}
"#
    );
    load_layered_yaml_from_strings(&[DEFAULT_CONFIG_YAML, &overrides])
        .expect("config load must succeed")
        .config_json
}

fn set_all(prefix: &str) {
    std::env::set_var(format!("{prefix}_URL"), "ldap://10.0.0.5");
    std::env::set_var(format!("{prefix}_BASE_DN"), "DC=example,DC=local");
    std::env::set_var(format!("{prefix}_BIND_DN"), "EXAMPLE\\svc-sync");
    std::env::set_var(format!("{prefix}_BIND_PASSWORD"), "correct horse battery");
}

#[test]
fn all_env_present_resolves() {
    let prefix = "SDS_T_CRED_OK";
    set_all(prefix);
    let cfg = config_with_prefix(prefix, "");

    let creds = resolve_directory_credentials(&cfg).expect("all env vars set");
    assert_eq!(creds.url, "ldap://10.0.0.5");
    assert_eq!(creds.base_dn, "DC=example,DC=local");
    assert_eq!(creds.bind_dn, "EXAMPLE\\svc-sync");
    assert_eq!(creds.bind_password, "correct horse battery");
    assert_eq!(creds.connect_timeout_secs, 10);
    assert!(!creds.starttls);
}

#[test]
fn missing_password_names_the_variable() {
    let prefix = "SDS_T_CRED_NOPW";
    set_all(prefix);
    std::env::remove_var(format!("{prefix}_BIND_PASSWORD"));
    let cfg = config_with_prefix(prefix, "");

    let err = resolve_directory_credentials(&cfg).expect_err("password is required");
    let msg = err.to_string();
    assert!(msg.contains("SECRETS_MISSING"), "got: {msg}");
    assert!(msg.contains("SDS_T_CRED_NOPW_BIND_PASSWORD"), "got: {msg}");
}

#[test]
fn blank_bind_dn_counts_as_missing() {
    let prefix = "SDS_T_CRED_BLANK";
    set_all(prefix);
    std::env::set_var(format!("{prefix}_BIND_DN"), "   ");
    let cfg = config_with_prefix(prefix, "");

    let msg = resolve_directory_credentials(&cfg).unwrap_err().to_string();
    assert!(msg.contains("SDS_T_CRED_BLANK_BIND_DN"), "got: {msg}");
}

#[test]
fn literal_url_and_base_dn_win_over_env() {
    let prefix = "SDS_T_CRED_LITERAL";
    set_all(prefix);
    let cfg = config_with_prefix(
        prefix,
        "  url: \"ldaps://dc02.example.local:636\"\n  base_dn: \"OU=Students,DC=example,DC=local\"\n  starttls: false\n  connect_timeout_secs: 3",
    );

    let creds = resolve_directory_credentials(&cfg).unwrap();
    assert_eq!(creds.url, "ldaps://dc02.example.local:636");
    assert_eq!(creds.base_dn, "OU=Students,DC=example,DC=local");
    assert_eq!(creds.connect_timeout_secs, 3);
}

#[test]
fn non_ldap_url_rejected() {
    let prefix = "SDS_T_CRED_BADURL";
    set_all(prefix);
    std::env::set_var(format!("{prefix}_URL"), "http://10.0.0.5");
    let cfg = config_with_prefix(prefix, "");

    let msg = resolve_directory_credentials(&cfg).unwrap_err().to_string();
    assert!(msg.contains("CONFIG_INVALID"), "got: {msg}");
}
