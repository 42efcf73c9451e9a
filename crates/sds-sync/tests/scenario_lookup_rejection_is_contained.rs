//! A lookup the server refuses (size or admin limits, access rights) costs
//! only that row or that category; the session is still healthy.

use sds_config::{load_layered_yaml_from_strings, DEFAULT_CONFIG_YAML};
use sds_sync::{reconcile_record, report, run_sync, ReconcileOutcome, RuleGroup, RuleSet};
use sds_testkit::{student, FakeDirectory};

const NL: &str = "EMASI NAM LONG SCHOOL";
const VP: &str = "EMASI VAN PHUC SCHOOL";

fn rules() -> RuleSet {
    let cfg = load_layered_yaml_from_strings(&[DEFAULT_CONFIG_YAML]).unwrap();
    RuleSet::from_config_json(&cfg.config_json).unwrap()
}

#[tokio::test]
async fn rejected_lookup_marks_every_group() {
    let mut dir = FakeDirectory::new();
    dir.add_student("CN=A", "a@emasi.edu.vn")
        .reject_search_for("a@emasi.edu.vn", 11, "adminLimitExceeded");

    let rec = student("a@emasi.edu.vn", "Nam Long", "NLY10", "NL-10A");
    let report = reconcile_record(&mut dir, &rules(), &rec).await.unwrap();

    assert!(report.is_lookup_failure());
    assert_eq!(report.dn, None);
    for group in RuleGroup::ALL {
        assert!(matches!(
            report.outcome(group),
            Some(ReconcileOutcome::LookupFailed(reason)) if reason.contains("rc=11")
        ));
    }
    assert_eq!(dir.modify_count(), 0);
}

#[tokio::test]
async fn rejected_lookup_does_not_stop_later_rows() {
    let mut dir = FakeDirectory::new();
    dir.add_student("CN=A", "a@emasi.edu.vn")
        .add_student("CN=B", "b@emasi.edu.vn")
        .reject_search_for("a@emasi.edu.vn", 11, "adminLimitExceeded");

    let records = vec![
        student("a@emasi.edu.vn", "Van Phuc", "VPY7", "VP-7C"),
        student("b@emasi.edu.vn", "Van Phuc", "VPY7", "VP-7C"),
    ];
    let report = run_sync(&mut dir, &rules(), &records).await.unwrap();

    assert_eq!(report.counters.records, 2);
    assert_eq!(report.counters.lookup_failed, 1);
    assert_eq!(report.counters.no_match, 0);
    assert_eq!(report.counters.updated, 3);
    assert!(dir.modifies_for("CN=A").is_empty());
    assert_eq!(dir.modifies_for("CN=B").len(), 3);
    assert_eq!(report.categories.len(), 2);
    assert!(dir.is_disconnected());
}

#[tokio::test]
async fn rejected_category_search_skips_that_category_only() {
    let mut dir = FakeDirectory::new();
    dir.add_student_in("CN=a", "a@emasi.edu.vn", NL)
        .add_student_in("CN=v", "v@emasi.edu.vn", VP)
        .reject_search_for(NL, 4, "sizeLimitExceeded");

    let records = vec![
        student("a@emasi.edu.vn", "Nam Long", "NLY1", ""),
        student("v@emasi.edu.vn", "Van Phuc", "VPY1", ""),
    ];
    let diffs = report(&mut dir, &rules(), &records).await.unwrap();

    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].category, "Van Phuc");
    assert!(diffs[0].is_clean());
    assert_eq!(dir.search_count(), 2);
}
