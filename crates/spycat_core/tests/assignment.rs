use spycat_core::db::{open_db, open_db_in_memory};
use spycat_core::{
    AssignmentCoordinator, Cat, CatService, CoreError, EntityRef, ErrorKind, Mission,
    MissionLifecycle, MissionStatus, NewCat, NewMission, NewTarget, SqliteAssignmentRepository,
    SqliteCatRepository, SqliteMissionRepository, SqliteTargetRepository, StateConflict,
    StaticBreedCatalog, TargetLedger,
};
use rusqlite::Connection;
use std::sync::Barrier;

fn create_cat(conn: &Connection, name: &str) -> Cat {
    CatService::new(
        SqliteCatRepository::try_new(conn).unwrap(),
        StaticBreedCatalog::new(["Siamese"]),
    )
    .create_cat(&NewCat::new(name, 3, "Siamese", 1500.0))
    .unwrap()
}

fn create_mission(conn: &Connection, targets: usize) -> Mission {
    let targets = (0..targets)
        .map(|index| NewTarget::new(format!("Target {index}"), "France"))
        .collect();
    MissionLifecycle::new(SqliteMissionRepository::try_new(conn).unwrap())
        .create_mission(&NewMission::new("Recon", targets))
        .unwrap()
}

fn coordinator(conn: &Connection) -> AssignmentCoordinator<SqliteAssignmentRepository<'_>> {
    AssignmentCoordinator::new(SqliteAssignmentRepository::try_new(conn).unwrap())
}

#[test]
fn assign_links_both_sides() {
    let conn = open_db_in_memory().unwrap();
    let cat = create_cat(&conn, "Tom");
    let mission = create_mission(&conn, 1);

    let assignment = coordinator(&conn).assign(cat.id, mission.id).unwrap();
    assert!(assignment.cat.is_on_mission());
    assert_eq!(assignment.cat.mission_id, Some(mission.id));
    assert_eq!(assignment.mission.status, MissionStatus::Assigned);
    assert_eq!(assignment.mission.assigned_cat_id, Some(cat.id));
}

#[test]
fn assign_checks_preconditions_in_order() {
    let conn = open_db_in_memory().unwrap();
    let coordinator = coordinator(&conn);
    let missing_cat = uuid::Uuid::new_v4();
    let missing_mission = uuid::Uuid::new_v4();

    assert!(matches!(
        coordinator.assign(missing_cat, missing_mission),
        Err(CoreError::NotFound(EntityRef::Cat(id))) if id == missing_cat
    ));

    let busy_cat = create_cat(&conn, "Tom");
    assert!(matches!(
        coordinator.assign(busy_cat.id, missing_mission),
        Err(CoreError::NotFound(EntityRef::Mission(id))) if id == missing_mission
    ));

    let first = create_mission(&conn, 1);
    let second = create_mission(&conn, 1);
    coordinator.assign(busy_cat.id, first.id).unwrap();

    // Busy cat against a held mission reports the cat side first.
    assert!(matches!(
        coordinator.assign(busy_cat.id, first.id),
        Err(CoreError::Conflict(StateConflict::CatAlreadyAssigned { cat_id, mission_id }))
            if cat_id == busy_cat.id && mission_id == first.id
    ));
    assert!(matches!(
        coordinator.assign(busy_cat.id, second.id),
        Err(CoreError::Conflict(StateConflict::CatAlreadyAssigned { .. }))
    ));

    let free_cat = create_cat(&conn, "Jerry");
    assert!(matches!(
        coordinator.assign(free_cat.id, first.id),
        Err(CoreError::Conflict(StateConflict::MissionAlreadyAssigned { mission_id, cat_id }))
            if mission_id == first.id && cat_id == busy_cat.id
    ));
}

#[test]
fn mission_completes_after_last_target_and_frees_the_cat() {
    let conn = open_db_in_memory().unwrap();
    let ledger = TargetLedger::new(SqliteTargetRepository::try_new(&conn).unwrap());
    let lifecycle = MissionLifecycle::new(SqliteMissionRepository::try_new(&conn).unwrap());
    let cats = CatService::new(
        SqliteCatRepository::try_new(&conn).unwrap(),
        StaticBreedCatalog::new(["Siamese"]),
    );
    let coordinator = coordinator(&conn);

    let cat = create_cat(&conn, "Tom");
    let mission = create_mission(&conn, 2);
    coordinator.assign(cat.id, mission.id).unwrap();

    ledger.mark_complete(mission.targets[0].id).unwrap();
    assert_eq!(
        lifecycle.get_mission(mission.id).unwrap().status,
        MissionStatus::Assigned
    );

    ledger.mark_complete(mission.targets[1].id).unwrap();
    let completed = lifecycle.get_mission(mission.id).unwrap();
    assert_eq!(completed.status, MissionStatus::Completed);
    assert_eq!(completed.assigned_cat_id, None);
    assert!(completed.all_targets_completed());
    assert_eq!(cats.get_cat(cat.id).unwrap().mission_id, None);

    let second_cat = create_cat(&conn, "Jerry");
    let err = coordinator.assign(second_cat.id, mission.id).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Conflict(StateConflict::MissionAlreadyCompleted(id)) if id == mission.id
    ));

    let next = create_mission(&conn, 1);
    coordinator.assign(cat.id, next.id).unwrap();
}

#[test]
fn assigning_fully_completed_mission_completes_it_immediately() {
    let conn = open_db_in_memory().unwrap();
    let ledger = TargetLedger::new(SqliteTargetRepository::try_new(&conn).unwrap());
    let cat = create_cat(&conn, "Tom");
    let mission = create_mission(&conn, 1);
    ledger.mark_complete(mission.targets[0].id).unwrap();

    let assignment = coordinator(&conn).assign(cat.id, mission.id).unwrap();
    assert_eq!(assignment.mission.status, MissionStatus::Completed);
    assert_eq!(assignment.mission.assigned_cat_id, None);
    assert_eq!(assignment.cat.mission_id, None);
}

#[test]
fn unassign_releases_both_sides() {
    let conn = open_db_in_memory().unwrap();
    let coordinator = coordinator(&conn);
    let cat = create_cat(&conn, "Tom");
    let mission = create_mission(&conn, 1);

    assert!(matches!(
        coordinator.unassign(mission.id),
        Err(CoreError::Conflict(StateConflict::MissionNotAssigned(id))) if id == mission.id
    ));

    coordinator.assign(cat.id, mission.id).unwrap();
    let released = coordinator.unassign(mission.id).unwrap();
    assert_eq!(released.cat.mission_id, None);
    assert_eq!(released.mission.status, MissionStatus::Unassigned);
    assert_eq!(released.mission.assigned_cat_id, None);

    let other_cat = create_cat(&conn, "Jerry");
    coordinator.assign(other_cat.id, mission.id).unwrap();

    assert_eq!(
        coordinator
            .unassign(uuid::Uuid::new_v4())
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn concurrent_assignments_of_one_cat_admit_exactly_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agency.db");
    let setup = open_db(&path).unwrap();
    let cat = create_cat(&setup, "Tom");
    let missions = [create_mission(&setup, 1), create_mission(&setup, 1)];
    drop(setup);

    let barrier = Barrier::new(missions.len());
    let results = std::thread::scope(|scope| {
        let handles = missions
            .iter()
            .map(|mission| {
                let barrier = &barrier;
                let path = &path;
                scope.spawn(move || {
                    let conn = open_db(path).unwrap();
                    let coordinator = coordinator(&conn);
                    barrier.wait();
                    coordinator.assign(cat.id, mission.id)
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });

    let winners = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results.iter().any(|result| matches!(
        result,
        Err(CoreError::Conflict(StateConflict::CatAlreadyAssigned { .. }))
    )));

    let conn = open_db(&path).unwrap();
    let held: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM missions WHERE assigned_cat_id = ?1;",
            [cat.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(held, 1);
}

#[test]
fn concurrent_assignments_to_one_mission_admit_exactly_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agency.db");
    let setup = open_db(&path).unwrap();
    let cats = [create_cat(&setup, "Tom"), create_cat(&setup, "Jerry")];
    let mission = create_mission(&setup, 1);
    drop(setup);

    let barrier = Barrier::new(cats.len());
    let results = std::thread::scope(|scope| {
        let handles = cats
            .iter()
            .map(|cat| {
                let barrier = &barrier;
                let path = &path;
                let mission_id = mission.id;
                scope.spawn(move || {
                    let conn = open_db(path).unwrap();
                    let coordinator = coordinator(&conn);
                    barrier.wait();
                    coordinator.assign(cat.id, mission_id)
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });

    let winners = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results.iter().any(|result| matches!(
        result,
        Err(CoreError::Conflict(StateConflict::MissionAlreadyAssigned { mission_id, .. }))
            if *mission_id == mission.id
    )));

    let conn = open_db(&path).unwrap();
    let holders: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM cats WHERE mission_id = ?1;",
            [mission.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(holders, 1);
}
