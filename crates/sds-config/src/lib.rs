//! sds-config
//!
//! Layered YAML configuration for the student directory sync.
//!
//! - Embedded defaults (`defaults/base.yaml`) are the first layer; operator
//!   files are merged on top in the order given.
//! - Credentials are never stored as values. The config carries env var
//!   NAMES; [`secrets::resolve_directory_credentials`] reads the values.
//! - Every load produces a canonical JSON rendering and a SHA-256 hash so a
//!   run log can prove which effective config it used.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;

mod consumption;
pub mod secrets;

pub use consumption::consumed_pointers;
pub use secrets::{resolve_directory_credentials, DirectoryCredentials};

/// Built-in default layer.
pub const DEFAULT_CONFIG_YAML: &str = include_str!("../defaults/base.yaml");

/// Value shapes that are credentials wherever they appear: PEM key material
/// (client TLS keys) and RFC 2307 password hashes copied out of a directory.
const SECRET_PREFIXES: &[&str] = &[
    "-----BEGIN",
    "{SSHA}",
    "{SSHA256}",
    "{SSHA512}",
    "{SHA}",
    "{CRYPT}",
    "{MD5}",
];

/// Leaf key names that may only ever appear with an env var name suffix
/// (`*_env`). A literal value under one of these keys is a plaintext
/// credential.
const SECRET_KEY_NAMES: &[&str] = &["password", "bind_password", "passwd", "secret", "token"];

/// What to do when the effective config carries keys nothing reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Normalized consumed prefixes (sorted, unique).
    pub consumed_prefixes: Vec<String>,
    /// Leaf pointers no prefix covers (sorted, unique).
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Compare every leaf of the effective config against [`consumed_pointers`].
///
/// A typo in an override file (`term_lable`) silently leaves the default in
/// place, so callers surface this report before doing any work.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let consumed: BTreeSet<String> = consumed_pointers()
        .iter()
        .map(|p| normalize_pointer(p))
        .collect();

    let unused: BTreeSet<String> = leaf_pointers(config_json)
        .into_iter()
        .filter(|leaf| !consumed.iter().any(|c| pointer_covers(c, leaf)))
        .collect();

    let report = UnusedKeyReport {
        consumed_prefixes: consumed.into_iter().collect(),
        unused_leaf_pointers: unused.into_iter().collect(),
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        let first: Vec<&str> = report
            .unused_leaf_pointers
            .iter()
            .take(12)
            .map(String::as_str)
            .collect();
        bail!(
            "CONFIG_UNUSED_KEYS: {} config key(s) are never read: {}",
            report.unused_leaf_pointers.len(),
            first.join(", ")
        );
    }

    Ok(report)
}

/// Leading `/`, no trailing `/` (except the root pointer itself).
fn normalize_pointer(p: &str) -> String {
    let t = p.trim().trim_end_matches('/');
    if t.is_empty() {
        "/".to_string()
    } else if t.starts_with('/') {
        t.to_string()
    } else {
        format!("/{t}")
    }
}

/// `/a/b` covers `/a/b` and `/a/b/c`, never `/a/bc`.
fn pointer_covers(prefix: &str, leaf: &str) -> bool {
    prefix == "/"
        || leaf
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// RFC 6901 pointers of every scalar in `v`, in document order. Empty
/// objects and arrays contribute nothing.
fn leaf_pointers(v: &Value) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![(String::new(), v)];
    while let Some((ptr, node)) = stack.pop() {
        match node {
            Value::Object(map) => {
                for (k, child) in map.iter().rev() {
                    let token = k.replace('~', "~0").replace('/', "~1");
                    stack.push((format!("{ptr}/{token}"), child));
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate().rev() {
                    stack.push((format!("{ptr}/{i}"), child));
                }
            }
            _ if ptr.is_empty() => out.push("/".to_string()),
            _ => out.push(ptr),
        }
    }
    out
}

/// The effective config after all layers are merged.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// SHA-256 of `canonical_json`, lower-case hex.
    pub config_hash: String,
    /// Compact JSON with object keys sorted.
    pub canonical_json: String,
    pub config_json: Value,
}

/// Load the embedded defaults, then every file in `paths` on top of them.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut layers = vec![("defaults".to_string(), DEFAULT_CONFIG_YAML.to_string())];
    for p in paths {
        let text =
            fs::read_to_string(p).with_context(|| format!("CONFIG_INVALID: cannot read {p}"))?;
        layers.push((p.to_string(), text));
    }
    merge_layers(layers.iter().map(|(name, text)| (name.as_str(), text.as_str())))
}

/// Merge raw YAML documents in order: earlier docs are base, later docs
/// override. Does not add the embedded defaults.
pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let names: Vec<String> = (0..yaml_docs.len()).map(|i| format!("layer {i}")).collect();
    merge_layers(names.iter().map(String::as_str).zip(yaml_docs.iter().copied()))
}

fn merge_layers<'a>(layers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Default::default());
    for (name, text) in layers {
        let yaml: serde_yaml::Value = serde_yaml::from_str(text)
            .with_context(|| format!("CONFIG_INVALID: {name} is not valid YAML"))?;
        let overlay = serde_json::to_value(yaml)
            .with_context(|| format!("CONFIG_INVALID: {name} has non-JSON keys"))?;
        merge_into(&mut merged, overlay);
    }

    enforce_no_secret_literals(&merged)?;

    // serde_json::Map is a BTreeMap here, so serialization is key-sorted.
    let canonical_json =
        serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));

    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

// Objects merge key by key; anything else in the overlay replaces the base.
// Arrays are therefore replaced wholesale, so an override file that lists
// `rules.categories` owns the entire table.
fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (k, v) in overlay_map {
                merge_into(base_map.entry(k).or_insert(Value::Null), v);
            }
        }
        (slot, v) => *slot = v,
    }
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    for ptr in leaf_pointers(v) {
        let Some(s) = v.pointer(&ptr).and_then(Value::as_str) else {
            continue;
        };
        if looks_like_secret(s) || (is_secret_key(&ptr) && !s.trim().is_empty()) {
            bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim_start();
    SECRET_PREFIXES
        .iter()
        .any(|p| t.len() > p.len() && t.get(..p.len()).is_some_and(|h| h.eq_ignore_ascii_case(p)))
}

fn is_secret_key(pointer: &str) -> bool {
    let last = pointer.rsplit('/').next().unwrap_or("");
    let last = last.to_ascii_lowercase();
    SECRET_KEY_NAMES.contains(&last.as_str())
}
