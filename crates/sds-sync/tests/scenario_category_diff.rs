//! Category statistics: roster {a,b,c} against directory {b,c,d}.

use sds_config::{load_layered_yaml_from_strings, DEFAULT_CONFIG_YAML};
use sds_sync::{report, RuleSet};
use sds_testkit::{student, FakeDirectory};

const NL: &str = "EMASI NAM LONG SCHOOL";
const VP: &str = "EMASI VAN PHUC SCHOOL";

fn rules() -> RuleSet {
    let cfg = load_layered_yaml_from_strings(&[DEFAULT_CONFIG_YAML]).unwrap();
    RuleSet::from_config_json(&cfg.config_json).unwrap()
}

#[tokio::test]
async fn nam_long_diff_reports_both_sides() {
    let mut dir = FakeDirectory::new();
    dir.add_student_in("CN=b", "b@emasi.edu.vn", NL)
        .add_student_in("CN=c", "c@emasi.edu.vn", NL)
        .add_student_in("CN=d", "d@emasi.edu.vn", NL)
        .add_student_in("CN=v", "v@emasi.edu.vn", VP);

    let records = vec![
        student("a@emasi.edu.vn", "Nam Long", "NLY1", ""),
        student("b@emasi.edu.vn", "Nam Long", "NLY1", ""),
        student("c@emasi.edu.vn", "Nam Long", "NLY1", ""),
        student("x@emasi.edu.vn", "Thao Dien", "Y1", ""),
    ];

    let diffs = report(&mut dir, &rules(), &records).await.unwrap();
    assert_eq!(diffs.len(), 2);

    let nl = &diffs[0];
    assert_eq!(nl.category, "Nam Long");
    assert_eq!(nl.source_count, 3);
    assert_eq!(nl.directory_count, 3);
    assert_eq!(nl.source_only.iter().collect::<Vec<_>>(), vec!["a@emasi.edu.vn"]);
    assert_eq!(nl.directory_only.iter().collect::<Vec<_>>(), vec!["d@emasi.edu.vn"]);

    // unknown categories are excluded; Van Phuc has no roster rows
    let vp = &diffs[1];
    assert_eq!(vp.category, "Van Phuc");
    assert_eq!(vp.source_count, 0);
    assert_eq!(vp.directory_count, 1);
    assert!(vp.directory_only.contains("v@emasi.edu.vn"));

    // one company search per category, mail only
    assert_eq!(dir.search_count(), 2);
    assert_eq!(dir.searches()[0].filter.to_string(), format!("(company={NL})"));
    assert_eq!(dir.searches()[0].attributes, vec!["mail".to_string()]);
}

#[tokio::test]
async fn matching_sets_are_clean() {
    let mut dir = FakeDirectory::new();
    dir.add_student_in("CN=a", "a@emasi.edu.vn", VP);

    let records = vec![student("a@emasi.edu.vn", "Van Phuc", "VPY2", "VP-2A")];
    let diffs = report(&mut dir, &rules(), &records).await.unwrap();

    assert!(diffs[1].is_clean());
}
