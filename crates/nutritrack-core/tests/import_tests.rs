//! Dataset import integration tests.

use nutritrack_core::accounts::{Accounts, ClaimRequest};
use nutritrack_core::db::Database;
use nutritrack_core::import::{
    parse_row, HeaderMap, ImportCoordinator, ImportOutcome, RowError, ScoreColumn,
};
use nutritrack_core::models::{ScoreCategory, Sex};
use nutritrack_core::scoring::{self, TotalScoreSource};

fn header() -> String {
    let mut names = vec!["User_ID".to_string(), "Sex".to_string(), "PhoneNumber".to_string()];
    for column in ScoreColumn::all() {
        names.push(column.name_for(Sex::Male));
        names.push(column.name_for(Sex::Female));
    }
    names.join(",")
}

/// A row whose male columns hold `male` values and female columns `female`.
/// Sub-scores are the category maximum scaled by the given fraction.
fn row(id: i64, sex: &str, phone: &str, male: (f64, f64), female: (f64, f64)) -> String {
    let mut fields = vec![id.to_string(), sex.to_string(), phone.to_string()];
    fields.push(male.0.to_string());
    fields.push(female.0.to_string());
    for category in ScoreCategory::ALL {
        fields.push((category.max_score() * male.1).to_string());
        fields.push((category.max_score() * female.1).to_string());
    }
    fields.join(",")
}

fn dataset(rows: &[String]) -> String {
    let mut text = header();
    for r in rows {
        text.push('\n');
        text.push_str(r);
    }
    text.push('\n');
    text
}

fn two_patient_dataset() -> String {
    dataset(&[
        row(1, "Male", "0412345678", (60.0, 0.5), (0.0, 0.0)),
        row(2, "Female", "0400000000", (0.0, 0.0), (70.0, 0.8)),
    ])
}

#[test]
fn test_two_row_import_and_averages() {
    let db = Database::open_in_memory().unwrap();
    let outcome = ImportCoordinator::new(&db).run(&two_patient_dataset()).unwrap();

    let ImportOutcome::Completed(report) = outcome else {
        panic!("expected a completed import");
    };
    assert_eq!(report.rows_processed, 2);
    assert_eq!(report.imported, 2);
    assert!(report.failures.is_empty());

    let male = db.get_patient(1).unwrap().unwrap();
    assert_eq!(male.sex, Sex::Male);
    assert_eq!(male.total_score, 60.0);
    assert_eq!(male.scores.fruit, 5.0);
    assert_eq!(male.scores.water, 2.5);

    let female = db.get_patient(2).unwrap().unwrap();
    assert_eq!(female.total_score, 70.0);
    assert_eq!(female.scores.fruit, 8.0);

    let patients = db.list_patients().unwrap();
    let averages = scoring::average_by_sex(&patients, TotalScoreSource::Stored);
    assert_eq!(averages.male, 60.0);
    assert_eq!(averages.female, 70.0);
}

#[test]
fn test_forced_reimport_is_idempotent() {
    let db = Database::open_in_memory().unwrap();
    let coordinator = ImportCoordinator::new(&db);
    let source = two_patient_dataset();

    coordinator.run(&source).unwrap();
    let first = db.list_patients().unwrap();

    let report = coordinator.run_forced(&source).unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(db.list_patients().unwrap(), first);
}

#[test]
fn test_guard_skips_second_run() {
    let db = Database::open_in_memory().unwrap();
    let coordinator = ImportCoordinator::new(&db);
    coordinator.run(&two_patient_dataset()).unwrap();

    // A bigger dataset is not read once the guard is set
    let bigger = dataset(&[
        row(1, "Male", "0412345678", (60.0, 0.5), (0.0, 0.0)),
        row(2, "Female", "0400000000", (0.0, 0.0), (70.0, 0.8)),
        row(3, "Male", "0411111111", (40.0, 0.3), (0.0, 0.0)),
    ]);
    assert_eq!(
        coordinator.run(&bigger).unwrap(),
        ImportOutcome::Skipped {
            dataset_changed: Some(true)
        }
    );
    assert_eq!(db.count_patients().unwrap(), 2);
}

#[test]
fn test_guard_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nutritrack.db");

    {
        let db = Database::open(&path).unwrap();
        ImportCoordinator::new(&db).run(&two_patient_dataset()).unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert!(db.is_patients_imported().unwrap());
    assert_eq!(db.count_patients().unwrap(), 2);

    let dataset_path = dir.path().join("missing.csv");
    assert_eq!(
        ImportCoordinator::new(&db).run_from_path(&dataset_path).unwrap(),
        ImportOutcome::Skipped {
            dataset_changed: None
        }
    );
}

#[test]
fn test_import_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let dataset_path = dir.path().join("user_data.csv");
    std::fs::write(&dataset_path, two_patient_dataset()).unwrap();

    let db = Database::open_in_memory().unwrap();
    let outcome = ImportCoordinator::new(&db).run_from_path(&dataset_path).unwrap();
    assert!(matches!(outcome, ImportOutcome::Completed(ref r) if r.imported == 2));
}

#[test]
fn test_malformed_rows_skipped() {
    let mut bad_score = row(3, "Male", "0411111111", (40.0, 0.3), (0.0, 0.0));
    bad_score = bad_score.replacen(",40,", ",forty,", 1);

    let source = dataset(&[
        row(1, "Male", "0412345678", (60.0, 0.5), (0.0, 0.0)),
        String::new(),
        bad_score,
        row(4, "Unknown", "0422222222", (10.0, 0.1), (10.0, 0.1)),
        row(5, "Female", "0433333333", (0.0, 0.0), (120.0, 0.1)),
        "6,Female".to_string(),
    ]);

    let db = Database::open_in_memory().unwrap();
    let ImportOutcome::Completed(report) = ImportCoordinator::new(&db).run(&source).unwrap() else {
        panic!("expected a completed import");
    };

    assert_eq!(report.rows_processed, 5);
    assert_eq!(report.imported, 1);
    assert_eq!(report.failures.len(), 4);

    // Line numbers count the header and the blank line
    assert_eq!(report.failures[0].line, 4);
    assert!(matches!(report.failures[0].reason, RowError::Unparsable { ref column, .. } if column == "HEIFAtotalscoreMale"));
    assert!(matches!(report.failures[1].reason, RowError::Unparsable { ref column, .. } if column == "Sex"));
    assert!(matches!(report.failures[2].reason, RowError::OutOfRange { max, .. } if max == 100.0));
    assert!(matches!(report.failures[3].reason, RowError::TooFewFields { .. }));

    assert_eq!(db.all_patient_ids().unwrap(), vec![1]);
    assert!(db.is_patients_imported().unwrap());
}

#[test]
fn test_dataset_with_byte_order_mark() {
    let source = format!("\u{FEFF}{}", two_patient_dataset());

    let db = Database::open_in_memory().unwrap();
    let outcome = ImportCoordinator::new(&db).run(&source).unwrap();
    assert!(matches!(outcome, ImportOutcome::Completed(ref r) if r.imported == 2 && r.failures.is_empty()));
    assert!(db.is_patients_imported().unwrap());
    assert_eq!(db.all_patient_ids().unwrap(), vec![1, 2]);
}

#[test]
fn test_parsed_row_round_trips_through_store() {
    let header = HeaderMap::parse(&header()).unwrap();
    let db = Database::open_in_memory().unwrap();

    for line in [
        row(1, "Male", "0412345678", (60.5, 0.5), (0.0, 0.0)),
        row(2, "Female", "0400000000", (0.0, 0.0), (71.25, 0.8)),
    ] {
        let patient = parse_row(&header, &line).unwrap();
        db.upsert_patient(&patient).unwrap();
        assert_eq!(db.get_patient(patient.patient_id).unwrap(), Some(patient));
    }
}

#[test]
fn test_upsert_overwrites_on_reimport() {
    let db = Database::open_in_memory().unwrap();
    let coordinator = ImportCoordinator::new(&db);
    coordinator.run(&two_patient_dataset()).unwrap();

    let updated = dataset(&[row(1, "Male", "0499999999", (75.0, 1.0), (0.0, 0.0))]);
    coordinator.run_forced(&updated).unwrap();

    let patient = db.get_patient(1).unwrap().unwrap();
    assert_eq!(patient.phone_number, "0499999999");
    assert_eq!(patient.total_score, 75.0);
    assert_eq!(patient.scores.fruit, 10.0);
    assert_eq!(db.count_patients().unwrap(), 2);
}

#[test]
fn test_forced_reimport_keeps_registration() {
    let db = Database::open_in_memory().unwrap();
    let coordinator = ImportCoordinator::new(&db);
    coordinator.run(&two_patient_dataset()).unwrap();

    Accounts::new(&db)
        .claim_patient(&ClaimRequest {
            patient_id: 1,
            phone_number: "0412345678",
            name: "Alex",
            password: "abc123",
            confirm_password: "abc123",
        })
        .unwrap();

    coordinator.run_forced(&two_patient_dataset()).unwrap();
    assert_eq!(db.registered_patient_ids().unwrap(), vec![1]);
    assert!(Accounts::new(&db).login(1, "abc123").is_ok());
}
