use chrono::NaiveDate;
use rusqlite::Connection;
use staffledger_core::db::open_db_in_memory;
use staffledger_core::{
    search_employees, search_persons, DateRange, DeleteMode, DepartmentDraft,
    DirectoryRepository, EmployeeFilter, EmploymentRepository, ErrorKind, HireRequest,
    PersonDraft, PersonId, PersonRepository, PersonSearchQuery, PositionDetails, PositionId,
    SqliteDirectoryRepository, SqliteEmploymentRepository, SqlitePersonRepository,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn register(conn: &Connection, first: &str, last: &str) -> PersonId {
    SqlitePersonRepository::new(conn)
        .create_person(&PersonDraft::new(
            first,
            last,
            format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
        ))
        .unwrap()
        .id
}

fn hire(conn: &Connection, person_id: PersonId, position_id: PositionId, start: NaiveDate) {
    SqliteEmploymentRepository::new(conn)
        .hire(&HireRequest {
            person_id,
            position_id,
            start_date: start,
            salary: 10,
        })
        .unwrap();
}

#[test]
fn person_search_prefix_matches_names() {
    let conn = open_db_in_memory().unwrap();
    let ada = register(&conn, "Ada", "Lovelace");
    register(&conn, "Alan", "Turing");
    register(&conn, "Grace", "Hopper");

    let hits = search_persons(&conn, &PersonSearchQuery::new("lov")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, ada);

    let both = search_persons(&conn, &PersonSearchQuery::new("a")).unwrap();
    assert_eq!(both.len(), 2);

    let narrowed = search_persons(&conn, &PersonSearchQuery::new("al tur")).unwrap();
    assert_eq!(narrowed.len(), 1);
    assert_eq!(narrowed[0].last_name, "Turing");

    assert!(search_persons(&conn, &PersonSearchQuery::new("   "))
        .unwrap()
        .is_empty());
}

#[test]
fn person_search_follows_renames_and_skips_tombstones() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::new(&conn);
    let ada = register(&conn, "Ada", "Lovelace");
    repo.replace_person(ada, &PersonDraft::new("Augusta", "King", "ada@example.com"))
        .unwrap();

    assert!(search_persons(&conn, &PersonSearchQuery::new("lovelace"))
        .unwrap()
        .is_empty());
    assert_eq!(
        search_persons(&conn, &PersonSearchQuery::new("king"))
            .unwrap()
            .len(),
        1
    );

    repo.delete_person(ada, DeleteMode::Block, date(2024, 6, 1)).unwrap();
    assert!(search_persons(&conn, &PersonSearchQuery::new("king"))
        .unwrap()
        .is_empty());
}

#[test]
fn employee_filters_combine() {
    let conn = open_db_in_memory().unwrap();
    let directory = SqliteDirectoryRepository::new(&conn);
    let ops = directory
        .create_department(&DepartmentDraft::new("Ops"))
        .unwrap();
    let lab = directory
        .create_department(&DepartmentDraft::new("Lab"))
        .unwrap();
    let clerk = directory
        .create_position(ops.id, &PositionDetails::new("Clerk"))
        .unwrap();
    let chemist = directory
        .create_position(lab.id, &PositionDetails::new("Chemist"))
        .unwrap();

    let ada = register(&conn, "Ada", "Lovelace");
    let alan = register(&conn, "Alan", "Turing");
    let grace = register(&conn, "Grace", "Hopper");
    register(&conn, "Idle", "Person");
    hire(&conn, ada, clerk.id, date(2023, 5, 1));
    hire(&conn, alan, chemist.id, date(2024, 2, 1));
    hire(&conn, grace, clerk.id, date(2024, 8, 1));

    let as_of = date(2024, 3, 1);
    let everyone = search_employees(&conn, &EmployeeFilter::new(as_of)).unwrap();
    let order = everyone
        .iter()
        .map(|hit| hit.person.last_name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["Hopper", "Lovelace", "Person", "Turing"]);
    assert!(everyone[0].employment.is_none());

    let active = search_employees(
        &conn,
        &EmployeeFilter {
            active_only: true,
            ..EmployeeFilter::new(as_of)
        },
    )
    .unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|hit| hit.employment.is_some()));

    let in_ops = search_employees(
        &conn,
        &EmployeeFilter {
            department_id: Some(ops.id),
            ..EmployeeFilter::new(date(2024, 9, 1))
        },
    )
    .unwrap();
    let ops_people = in_ops.iter().map(|hit| hit.person.id).collect::<Vec<_>>();
    assert_eq!(ops_people, vec![grace, ada]);

    let chemists = search_employees(
        &conn,
        &EmployeeFilter {
            position_id: Some(chemist.id),
            ..EmployeeFilter::new(as_of)
        },
    )
    .unwrap();
    assert_eq!(chemists.len(), 1);
    assert_eq!(chemists[0].person.id, alan);

    let hired_2024 = search_employees(
        &conn,
        &EmployeeFilter {
            hired_between: Some(DateRange::new(date(2024, 1, 1), date(2024, 12, 31)).unwrap()),
            ..EmployeeFilter::new(as_of)
        },
    )
    .unwrap();
    let hired_people = hired_2024.iter().map(|hit| hit.person.id).collect::<Vec<_>>();
    assert_eq!(hired_people, vec![grace, alan]);
    assert!(hired_2024[0].employment.is_none());

    let by_name = search_employees(
        &conn,
        &EmployeeFilter {
            name: Some("a".to_string()),
            active_only: true,
            ..EmployeeFilter::new(as_of)
        },
    )
    .unwrap();
    let names = by_name
        .iter()
        .map(|hit| hit.person.first_name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Ada", "Alan"]);

    let by_email = search_employees(
        &conn,
        &EmployeeFilter {
            email: Some(" ALAN.turing@example.com ".to_string()),
            ..EmployeeFilter::new(as_of)
        },
    )
    .unwrap();
    assert_eq!(by_email.len(), 1);
    assert_eq!(by_email[0].person.id, alan);

    let paged = search_employees(
        &conn,
        &EmployeeFilter {
            limit: Some(2),
            offset: 2,
            ..EmployeeFilter::new(as_of)
        },
    )
    .unwrap();
    assert_eq!(paged.len(), 2);
    assert_eq!(paged[0].person.last_name, "Person");
}

#[test]
fn malformed_email_filter_is_invalid_argument() {
    let conn = open_db_in_memory().unwrap();
    let err = search_employees(
        &conn,
        &EmployeeFilter {
            email: Some("nope".to_string()),
            ..EmployeeFilter::new(date(2024, 1, 1))
        },
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}
