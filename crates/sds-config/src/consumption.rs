/// Registry of JSON-pointer prefixes the sync actually reads.
///
/// Keep this in step with the readers:
/// - secrets::resolve_directory_credentials  -> /directory/*
/// - sds_sync::RuleSet::from_config_json      -> /rules/*
/// - sds-cli log file resolution              -> /logging/file
pub fn consumed_pointers() -> &'static [&'static str] {
    CONSUMED
}

static CONSUMED: &[&str] = &[
    "/directory/url",
    "/directory/url_env",
    "/directory/base_dn",
    "/directory/base_dn_env",
    "/directory/bind_dn_env",
    "/directory/bind_password_env",
    "/directory/connect_timeout_secs",
    "/directory/starttls",
    "/rules/title",
    "/rules/term_label",
    "/rules/categories", // whole table; entries are validated by RuleSet
    "/logging/file",
];
