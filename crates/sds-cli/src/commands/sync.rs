use std::path::Path;

use anyhow::{Context, Result};
use sds_config::{LoadedConfig, UnusedKeyPolicy};
use sds_directory::LdapGateway;
use sds_sync::{RuleSet, RunReport};
use tracing::{info, warn};

pub struct SyncArgs<'a> {
    pub input: &'a Path,
    pub loaded: &'a LoadedConfig,
    pub term: Option<&'a str>,
}

/// Everything up to the first directory call can fail without side effects:
/// config, rules, roster and credentials are all checked before connecting.
pub async fn run(args: SyncArgs<'_>) -> Result<()> {
    let loaded = args.loaded;
    info!(config_hash = %loaded.config_hash, "config loaded");

    let unused = sds_config::report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for ptr in &unused.unused_leaf_pointers {
        warn!(pointer = %ptr, "unused config key");
    }

    let mut rules = RuleSet::from_config_json(&loaded.config_json)?;
    if let Some(term) = args.term {
        rules = rules.with_term_label(term)?;
    }
    info!(
        term = %rules.term_label,
        categories = rules.categories.len(),
        "rules ready"
    );

    let records = sds_roster::read_roster(args.input)
        .with_context(|| format!("read roster failed: {}", args.input.display()))?;
    info!(path = %args.input.display(), records = records.len(), "roster loaded");

    let creds = sds_config::resolve_directory_credentials(&loaded.config_json)?;
    let mut gateway = LdapGateway::connect(&creds)
        .await
        .context("connect to directory failed")?;

    let report = sds_sync::run_sync(&mut gateway, &rules, &records)
        .await
        .context("sync aborted")?;

    print_summary(&loaded.config_hash, &report);
    Ok(())
}

fn print_summary(config_hash: &str, report: &RunReport) {
    let c = &report.counters;
    println!("config_hash={}", config_hash);
    println!("started_at_utc={}", report.started_at_utc.to_rfc3339());
    println!("finished_at_utc={}", report.finished_at_utc.to_rfc3339());
    println!("records={}", c.records);
    println!("skipped_blank_email={}", c.skipped_blank_email);
    println!("no_match={}", c.no_match);
    println!("lookup_failed={}", c.lookup_failed);
    println!("duplicate_matches={}", c.duplicate_matches);
    println!("updated={}", c.updated);
    println!("nothing_to_write={}", c.nothing_to_write);
    println!("failed={}", c.failed);
    for d in &report.categories {
        println!(
            "category={:?} csv_count={} ad_count={} csv_only={} ad_only={}",
            d.category,
            d.source_count,
            d.directory_count,
            d.source_only.len(),
            d.directory_only.len()
        );
    }
}
