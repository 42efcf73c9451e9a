//! Losing the transport mid-batch ends the run with an error, and the
//! gateway is still closed.

use sds_config::{load_layered_yaml_from_strings, DEFAULT_CONFIG_YAML};
use sds_directory::DirectoryError;
use sds_sync::{run_sync, RuleSet};
use sds_testkit::{student, FakeDirectory};

fn rules() -> RuleSet {
    let cfg = load_layered_yaml_from_strings(&[DEFAULT_CONFIG_YAML]).unwrap();
    RuleSet::from_config_json(&cfg.config_json).unwrap()
}

#[tokio::test]
async fn loss_during_writes_aborts_batch() {
    let mut dir = FakeDirectory::new();
    dir.add_student("CN=A", "a@emasi.edu.vn")
        .add_student("CN=B", "b@emasi.edu.vn")
        // lookup + first replace succeed, the second replace hits a dead socket
        .lose_connection_after(2);

    let records = vec![
        student("a@emasi.edu.vn", "Nam Long", "NLY10", "NL-10A"),
        student("b@emasi.edu.vn", "Nam Long", "NLY10", "NL-10A"),
    ];

    let err = run_sync(&mut dir, &rules(), &records).await.unwrap_err();
    assert!(matches!(err, DirectoryError::ConnectionLost(_)));

    assert_eq!(dir.modify_count(), 1);
    assert!(dir.modifies_for("CN=B").is_empty());
    assert!(dir.is_disconnected());
}

#[tokio::test]
async fn loss_during_statistics_aborts_batch() {
    let mut dir = FakeDirectory::new();
    dir.add_student("CN=A", "a@emasi.edu.vn")
        // lookup + three replaces, then the first company search fails
        .lose_connection_after(4);

    let records = vec![student("a@emasi.edu.vn", "Nam Long", "NLY10", "NL-10A")];

    let err = run_sync(&mut dir, &rules(), &records).await.unwrap_err();
    assert!(matches!(err, DirectoryError::ConnectionLost(_)));
    assert_eq!(dir.modify_count(), 3);
}
