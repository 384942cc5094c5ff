use chrono::NaiveDate;
use rusqlite::Connection;
use staffledger_core::db::open_db_in_memory;
use staffledger_core::{
    Address, ConflictReason, ContactUpdate, DeleteMode, DeleteOutcome, DepartmentDraft,
    DirectoryRepository, EmploymentRepository, ErrorKind, HireRequest, PersonDraft,
    PersonRepository, PersonService, PositionDetails, RepoError, SqliteDirectoryRepository,
    SqliteEmploymentRepository, SqlitePersonRepository,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn berlin() -> Address {
    Address {
        street: "Unter den Linden 1".to_string(),
        city: "Berlin".to_string(),
        region: None,
        postal_code: Some("10117".to_string()),
        country: "DE".to_string(),
    }
}

fn hire_somewhere(conn: &Connection, person_id: uuid::Uuid, start: NaiveDate) -> uuid::Uuid {
    let directory = SqliteDirectoryRepository::new(conn);
    let department = directory
        .create_department(&DepartmentDraft::new(format!("Dept {start}")))
        .unwrap();
    let position = directory
        .create_position(department.id, &PositionDetails::new("Analyst"))
        .unwrap();
    SqliteEmploymentRepository::new(conn)
        .hire(&HireRequest {
            person_id,
            position_id: position.id,
            start_date: start,
            salary: 50_000,
        })
        .unwrap()
        .id
}

#[test]
fn register_normalizes_and_reads_back() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::new(&conn));

    let person = service
        .register(
            &PersonDraft::new("  Ada ", "Lovelace", " Ada@Example.COM ")
                .with_phone("+44 20 0000")
                .with_address(berlin()),
        )
        .unwrap();

    assert_eq!(person.first_name, "Ada");
    assert_eq!(person.email, "ada@example.com");
    assert_eq!(person.address, Some(berlin()));
    assert!(!person.is_deleted);

    let by_email = service.find_by_email("ADA@example.com").unwrap().unwrap();
    assert_eq!(by_email.id, person.id);
    assert_eq!(service.get(person.id).unwrap(), person);
}

#[test]
fn duplicate_email_is_conflict() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::new(&conn);
    repo.create_person(&PersonDraft::new("A", "One", "dup@example.com"))
        .unwrap();

    let err = repo
        .create_person(&PersonDraft::new("B", "Two", "DUP@example.com"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(matches!(
        err,
        RepoError::Conflict(ConflictReason::DuplicateEmail(ref email)) if email == "dup@example.com"
    ));
}

#[test]
fn invalid_input_is_invalid_argument() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::new(&conn);

    let blank = repo
        .create_person(&PersonDraft::new(" ", "Two", "x@example.com"))
        .unwrap_err();
    let bad_email = repo
        .create_person(&PersonDraft::new("A", "B", "not-an-email"))
        .unwrap_err();
    assert_eq!(blank.kind(), ErrorKind::InvalidArgument);
    assert_eq!(bad_email.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn contact_update_is_partial_and_checks_uniqueness() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::new(&conn);
    let ada = repo
        .create_person(&PersonDraft::new("Ada", "L", "ada@example.com").with_phone("111"))
        .unwrap();
    repo.create_person(&PersonDraft::new("Bob", "M", "bob@example.com"))
        .unwrap();

    let updated = repo
        .update_contact(
            ada.id,
            &ContactUpdate {
                email: None,
                phone: Some(None),
            },
        )
        .unwrap();
    assert_eq!(updated.email, "ada@example.com");
    assert_eq!(updated.phone, None);

    let err = repo
        .update_contact(
            ada.id,
            &ContactUpdate {
                email: Some("bob@example.com".to_string()),
                phone: None,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let same_email = repo
        .update_contact(
            ada.id,
            &ContactUpdate {
                email: Some("ADA@example.com".to_string()),
                phone: Some(Some("222".to_string())),
            },
        )
        .unwrap();
    assert_eq!(same_email.phone.as_deref(), Some("222"));
}

#[test]
fn address_update_sets_and_clears() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::new(&conn);
    let person = repo
        .create_person(&PersonDraft::new("Ada", "L", "ada@example.com"))
        .unwrap();

    let with_address = repo.update_address(person.id, Some(&berlin())).unwrap();
    assert_eq!(with_address.address, Some(berlin()));

    let cleared = repo.update_address(person.id, None).unwrap();
    assert_eq!(cleared.address, None);
    assert_eq!(cleared.email, "ada@example.com");
}

#[test]
fn replace_person_overwrites_every_field() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::new(&conn);
    let person = repo
        .create_person(
            &PersonDraft::new("Ada", "L", "ada@example.com")
                .with_phone("1")
                .with_address(berlin()),
        )
        .unwrap();

    let replaced = repo
        .replace_person(person.id, &PersonDraft::new("Augusta", "King", "augusta@example.com"))
        .unwrap();
    assert_eq!(replaced.first_name, "Augusta");
    assert_eq!(replaced.phone, None);
    assert_eq!(replaced.address, None);
    assert!(repo.get_person_by_email("ada@example.com").unwrap().is_none());
}

#[test]
fn unknown_person_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::new(&conn));
    let missing = uuid::Uuid::new_v4();

    assert_eq!(service.get(missing).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(
        service
            .delete(missing, DeleteMode::Block, date(2024, 7, 1))
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn delete_without_history_removes_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::new(&conn);
    let person = repo
        .create_person(&PersonDraft::new("Ada", "L", "ada@example.com"))
        .unwrap();

    assert_eq!(
        repo.delete_person(person.id, DeleteMode::Block, date(2024, 7, 1))
            .unwrap(),
        DeleteOutcome::Removed
    );
    assert!(repo.get_person(person.id, true).unwrap().is_none());
    repo.create_person(&PersonDraft::new("Ada", "L", "ada@example.com"))
        .unwrap();
}

#[test]
fn delete_with_history_blocks_then_tombstones_on_cascade() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::new(&conn);
    let person = repo
        .create_person(&PersonDraft::new("Ada", "L", "ada@example.com"))
        .unwrap();
    let employment_id = hire_somewhere(&conn, person.id, date(2024, 1, 1));

    let open = repo
        .delete_person(person.id, DeleteMode::Cascade, date(2024, 7, 1))
        .unwrap_err();
    assert_eq!(open.kind(), ErrorKind::Conflict);

    SqliteEmploymentRepository::new(&conn)
        .terminate(employment_id, date(2024, 6, 1))
        .unwrap();

    let blocked = repo
        .delete_person(person.id, DeleteMode::Block, date(2024, 7, 1))
        .unwrap_err();
    assert!(matches!(
        blocked,
        RepoError::Conflict(ConflictReason::HasEmploymentHistory(_))
    ));

    assert_eq!(
        repo.delete_person(person.id, DeleteMode::Cascade, date(2024, 7, 1))
            .unwrap(),
        DeleteOutcome::Tombstoned
    );
    assert!(repo.get_person(person.id, false).unwrap().is_none());
    let tombstone = repo.get_person(person.id, true).unwrap().unwrap();
    assert!(tombstone.is_deleted);

    let history = SqliteEmploymentRepository::new(&conn)
        .history(person.id)
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[test]
fn list_is_paged_and_sorted_by_name() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::new(&conn));
    for (first, last) in [("Cy", "Zed"), ("Al", "Young"), ("Bo", "Young")] {
        service
            .register(&PersonDraft::new(
                first,
                last,
                format!("{}@example.com", first.to_lowercase()),
            ))
            .unwrap();
    }

    let page = service.list(Some(2), 0).unwrap();
    assert_eq!(page.applied_limit, 2);
    let names = page
        .items
        .iter()
        .map(|person| person.first_name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Al", "Bo"]);

    let rest = service.list(Some(2), 2).unwrap();
    assert_eq!(rest.items.len(), 1);
    assert_eq!(rest.items[0].first_name, "Cy");
}
