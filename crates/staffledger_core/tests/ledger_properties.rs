use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rusqlite::Connection;
use staffledger_core::db::open_db_in_memory;
use staffledger_core::model::employment::intervals_overlap;
use staffledger_core::{
    DepartmentDraft, DirectoryRepository, Employment, EmploymentRepository, HireRequest,
    PersonDraft, PersonId, PersonRepository, PositionDetails, PositionId,
    SqliteDirectoryRepository, SqliteEmploymentRepository, SqlitePersonRepository,
    TransferRequest,
};

#[derive(Debug, Clone)]
enum Op {
    Hire { day: u64, position: usize },
    Terminate { day: u64 },
    Transfer { day: u64, position: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..400, 0usize..3).prop_map(|(day, position)| Op::Hire { day, position }),
        (0u64..400).prop_map(|day| Op::Terminate { day }),
        (0u64..400, 0usize..3).prop_map(|(day, position)| Op::Transfer { day, position }),
    ]
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn day(offset: u64) -> NaiveDate {
    base_date().checked_add_days(Days::new(offset)).unwrap()
}

fn seed(conn: &Connection) -> (PersonId, Vec<PositionId>) {
    let directory = SqliteDirectoryRepository::new(conn);
    let department = directory
        .create_department(&DepartmentDraft::new("Ops"))
        .unwrap();
    let positions = ["A", "B", "C"]
        .iter()
        .map(|title| {
            directory
                .create_position(department.id, &PositionDetails::new(*title))
                .unwrap()
                .id
        })
        .collect();
    let person = SqlitePersonRepository::new(conn)
        .create_person(&PersonDraft::new("Pat", "Prop", "pat@example.com"))
        .unwrap();
    (person.id, positions)
}

/// Open record if any, otherwise the latest one.
fn target(history: &[Employment]) -> Option<&Employment> {
    history
        .iter()
        .find(|record| record.end_date.is_none())
        .or_else(|| history.last())
}

fn assert_history_consistent(history: &[Employment]) -> Result<(), TestCaseError> {
    let open = history.iter().filter(|record| record.end_date.is_none()).count();
    prop_assert!(open <= 1, "{open} open records");

    for (index, a) in history.iter().enumerate() {
        if let Some(end) = a.end_date {
            prop_assert!(a.start_date <= end);
        }
        for b in &history[index + 1..] {
            prop_assert!(
                !intervals_overlap(a.start_date, a.end_date, b.start_date, b.end_date),
                "{a:?} overlaps {b:?}"
            );
        }
    }

    for offset in (0..420).step_by(7) {
        let at = day(offset);
        let active = history.iter().filter(|record| record.is_active_at(at)).count();
        prop_assert!(active <= 1, "{active} active records on {at}");
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn random_transitions_never_overlap(ops in proptest::collection::vec(op_strategy(), 1..24)) {
        let conn = open_db_in_memory().unwrap();
        let (person_id, positions) = seed(&conn);
        let ledger = SqliteEmploymentRepository::new(&conn);

        for op in ops {
            let history = ledger.history(person_id).unwrap();
            let _ = match op {
                Op::Hire { day: offset, position } => ledger
                    .hire(&HireRequest {
                        person_id,
                        position_id: positions[position],
                        start_date: day(offset),
                        salary: 1_000,
                    })
                    .map(|_| ()),
                Op::Terminate { day: offset } => match target(&history) {
                    Some(record) => ledger.terminate(record.id, day(offset)).map(|_| ()),
                    None => Ok(()),
                },
                Op::Transfer { day: offset, position } => match target(&history) {
                    Some(record) => ledger
                        .transfer(&TransferRequest {
                            employment_id: record.id,
                            new_position_id: positions[position],
                            effective_date: day(offset),
                            new_salary: None,
                        })
                        .map(|_| ()),
                    None => Ok(()),
                },
            };

            let after = ledger.history(person_id).unwrap();
            assert_history_consistent(&after)?;
        }
    }

    #[test]
    fn terminate_is_never_applied_twice(first in 0u64..200, second in 0u64..400) {
        let conn = open_db_in_memory().unwrap();
        let (person_id, positions) = seed(&conn);
        let ledger = SqliteEmploymentRepository::new(&conn);
        let hired = ledger
            .hire(&HireRequest {
                person_id,
                position_id: positions[0],
                start_date: day(0),
                salary: 1_000,
            })
            .unwrap();

        ledger.terminate(hired.id, day(first)).unwrap();
        let err = ledger.terminate(hired.id, day(second)).unwrap_err();
        prop_assert_eq!(err.kind(), staffledger_core::ErrorKind::InvalidState);
        prop_assert_eq!(
            ledger.get_employment(hired.id).unwrap().unwrap().end_date,
            Some(day(first))
        );
    }
}
