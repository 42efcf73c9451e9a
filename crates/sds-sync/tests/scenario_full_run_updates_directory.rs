//! End to end over an in-memory directory: roster text in, attributes and
//! statistics out.

use sds_config::{load_layered_yaml_from_strings, DEFAULT_CONFIG_YAML};
use sds_roster::parse_roster_str;
use sds_sync::{run_sync, RuleSet};
use sds_testkit::FakeDirectory;

const ROSTER: &str = "\
Pupil Email Address,School Code,School Id,Boarding House,Year Code,Form
an.nguyen@emasi.edu.vn,NL0001,240001,Nam Long,NLY10,NL-10A
binh.tran@emasi.edu.vn,VP0002,240002,Van Phuc,VPY7,7C
chi.le@emasi.edu.vn,TD0003,240003,Thao Dien,G5,TD-5B
,XX0004,240004,Nam Long,NLY1,NL-1A
missing@emasi.edu.vn,NL0005,240005,Nam Long,NLY2,NL-2A
";

#[tokio::test]
async fn full_batch_writes_expected_attributes() {
    let cfg = load_layered_yaml_from_strings(&[DEFAULT_CONFIG_YAML]).unwrap();
    let rules = RuleSet::from_config_json(&cfg.config_json)
        .unwrap()
        .with_term_label("25-26")
        .unwrap();
    let records = parse_roster_str(ROSTER).unwrap();

    let mut dir = FakeDirectory::new();
    dir.add_student("CN=An,OU=Students", "an.nguyen@emasi.edu.vn")
        .add_student("CN=Binh,OU=Students", "binh.tran@emasi.edu.vn")
        .add_student("CN=Chi,OU=Students", "chi.le@emasi.edu.vn");

    let report = run_sync(&mut dir, &rules, &records).await.unwrap();

    let an = dir.entry("CN=An,OU=Students").unwrap();
    assert_eq!(an.first_value("employeeID"), Some("NL0001"));
    assert_eq!(an.first_value("employeeNumber"), Some("240001"));
    assert_eq!(an.first_value("title"), Some("Student"));
    assert_eq!(an.first_value("physicalDeliveryOfficeName"), Some("EMASI NAM LONG OFFICE"));
    assert_eq!(an.first_value("company"), Some("EMASI NAM LONG SCHOOL"));
    assert_eq!(an.first_value("department"), Some("Year 10"));
    assert_eq!(an.first_value("description"), Some("Year 25-26 HR 10A"));

    // unprefixed form: no description written
    let binh = dir.entry("CN=Binh,OU=Students").unwrap();
    assert_eq!(binh.first_value("company"), Some("EMASI VAN PHUC SCHOOL"));
    assert_eq!(binh.first_value("department"), Some("Year 7"));
    assert_eq!(binh.first_value("description"), None);

    // unknown boarding house: no office/company, department passes through
    let chi = dir.entry("CN=Chi,OU=Students").unwrap();
    assert_eq!(chi.first_value("company"), None);
    assert_eq!(chi.first_value("department"), Some("G5"));
    assert_eq!(chi.first_value("description"), None);

    let c = &report.counters;
    assert_eq!(c.records, 5);
    assert_eq!(c.skipped_blank_email, 1);
    assert_eq!(c.no_match, 1);
    assert_eq!(c.updated, 8);
    assert_eq!(c.nothing_to_write, 1);
    assert_eq!(c.failed, 0);
    assert!(report.started_at_utc <= report.finished_at_utc);

    // statistics run after the writes, so companies are already in place
    let nl = &report.categories[0];
    assert_eq!(nl.source_count, 3);
    assert_eq!(nl.directory_count, 1);
    assert_eq!(
        nl.source_only.iter().collect::<Vec<_>>(),
        vec!["missing@emasi.edu.vn"]
    );
    assert!(nl.directory_only.is_empty());

    assert!(dir.is_disconnected());
}
