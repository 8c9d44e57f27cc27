use circleboard_core::db::open_db_in_memory;
use circleboard_core::hierarchy::circle_tree::{build_circle_tree, CircleRecord, RoleRecord};
use circleboard_core::repo::circle_repo::SqliteCircleRepository;
use circleboard_core::service::circle_service::CircleDetails;
use circleboard_core::{CircleService, CircleServiceError};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn insert_person(conn: &Connection, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO people (uuid, display_name) VALUES (?1, ?2);",
        [id.to_string(), name.to_string()],
    )
    .unwrap();
    id
}

#[test]
fn records_with_both_role_forms_build_complete_tree() {
    let root = Uuid::new_v4();
    let board = Uuid::new_v4();
    let events = Uuid::new_v4();
    let records: Vec<CircleRecord> = serde_json::from_value(serde_json::json!([
        { "id": root, "name": "Elternverein", "color": "#334155" },
        { "id": board, "name": "Vorstand", "parent_circle_id": root },
        { "id": events, "name": "Feste", "parent_circle_id": root, "icon": "party" }
    ]))
    .unwrap();
    let roles: Vec<RoleRecord> = serde_json::from_value(serde_json::json!([
        { "id": Uuid::new_v4(), "name": "Kassenwart", "circle_id": board },
        { "id": Uuid::new_v4(), "name": "Lead Link", "circle": { "id": root } },
        { "id": Uuid::new_v4(), "name": "Einkauf", "circle": { "id": events } }
    ]))
    .unwrap();

    let tree = build_circle_tree(&records, &roles).unwrap();

    assert_eq!(tree.id, root);
    assert_eq!(tree.circle_count(), 3);
    assert_eq!(
        tree.children.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        vec!["Vorstand", "Feste"]
    );
    assert_eq!(tree.roles.len(), 1);
    assert_eq!(tree.find(board).unwrap().roles[0].name, "Kassenwart");
    assert_eq!(tree.find(events).unwrap().icon.as_deref(), Some("party"));
    assert_eq!(tree.find(events).unwrap().roles[0].name, "Einkauf");
}

#[test]
fn building_twice_gives_identical_trees() {
    let root = CircleRecord {
        id: Uuid::new_v4(),
        name: "Root".to_string(),
        color: None,
        icon: None,
        parent_circle_id: None,
    };
    let children: Vec<CircleRecord> = (0..5)
        .map(|n| CircleRecord {
            id: Uuid::new_v4(),
            name: format!("Kreis {n}"),
            color: None,
            icon: None,
            parent_circle_id: Some(root.id),
        })
        .collect();
    let mut records = vec![root];
    records.extend(children);

    assert_eq!(
        build_circle_tree(&records, &[]),
        build_circle_tree(&records, &[])
    );
}

#[test]
fn service_loads_tree_from_database() {
    let conn = setup();
    let service = CircleService::new(SqliteCircleRepository::try_new(&conn).unwrap());

    let root = service
        .create_circle(None, "Elternverein", CircleDetails::default())
        .unwrap();
    let kita = service
        .create_circle(
            Some(root.uuid),
            "  Kita  ",
            CircleDetails {
                color: Some("#0ea5e9".to_string()),
                ..CircleDetails::default()
            },
        )
        .unwrap();
    let hort = service
        .create_circle(Some(root.uuid), "Hort", CircleDetails::default())
        .unwrap();
    service.create_role(kita.uuid, "Elternvertretung", None).unwrap();

    let tree = service.load_circle_tree().unwrap().unwrap();
    assert_eq!(tree.name, "Elternverein");
    assert_eq!(tree.children.len(), 2);
    assert_eq!(tree.children[0].id, kita.uuid);
    assert_eq!(tree.children[0].name, "Kita");
    assert_eq!(tree.children[0].color.as_deref(), Some("#0ea5e9"));
    assert_eq!(tree.children[0].roles[0].name, "Elternvertretung");
    assert_eq!(tree.children[1].id, hort.uuid);
    assert_eq!(tree.path_to(hort.uuid).len(), 2);
}

#[test]
fn create_circle_validates_input() {
    let conn = setup();
    let service = CircleService::new(SqliteCircleRepository::try_new(&conn).unwrap());

    let blank = service
        .create_circle(None, "   ", CircleDetails::default())
        .unwrap_err();
    assert_eq!(blank.code(), "validation");

    let missing_parent = service
        .create_circle(Some(Uuid::new_v4()), "Kita", CircleDetails::default())
        .unwrap_err();
    assert!(matches!(missing_parent, CircleServiceError::ParentNotFound(_)));
    assert_eq!(missing_parent.code(), "not_found");

    let bad_color = service
        .create_circle(
            None,
            "Kita",
            CircleDetails {
                color: Some("blau".to_string()),
                ..CircleDetails::default()
            },
        )
        .unwrap_err();
    assert_eq!(bad_color.code(), "validation");
}

#[test]
fn move_circle_rejects_cycles() {
    let conn = setup();
    let service = CircleService::new(SqliteCircleRepository::try_new(&conn).unwrap());

    let root = service
        .create_circle(None, "Root", CircleDetails::default())
        .unwrap();
    let a = service
        .create_circle(Some(root.uuid), "A", CircleDetails::default())
        .unwrap();
    let b = service
        .create_circle(Some(a.uuid), "B", CircleDetails::default())
        .unwrap();

    let into_self = service.move_circle(a.uuid, Some(a.uuid)).unwrap_err();
    assert!(matches!(into_self, CircleServiceError::CycleDetected { .. }));

    let into_descendant = service.move_circle(a.uuid, Some(b.uuid)).unwrap_err();
    assert!(matches!(
        into_descendant,
        CircleServiceError::CycleDetected { .. }
    ));
    assert_eq!(into_descendant.code(), "invalid_transition");

    let moved = service.move_circle(b.uuid, Some(root.uuid)).unwrap();
    assert_eq!(moved.parent_circle_uuid, Some(root.uuid));
    let tree = service.load_circle_tree().unwrap().unwrap();
    assert_eq!(tree.children.len(), 2);
}

#[test]
fn rename_keeps_position_in_tree() {
    let conn = setup();
    let service = CircleService::new(SqliteCircleRepository::try_new(&conn).unwrap());
    let root = service
        .create_circle(None, "Root", CircleDetails::default())
        .unwrap();
    let child = service
        .create_circle(Some(root.uuid), "Alt", CircleDetails::default())
        .unwrap();

    service.rename_circle(child.uuid, "Neu").unwrap();
    let tree = service.load_circle_tree().unwrap().unwrap();
    assert_eq!(tree.children[0].name, "Neu");
    assert!(service.rename_circle(child.uuid, " ").is_err());
}

#[test]
fn role_holders_follow_assignments() {
    let conn = setup();
    let anna = insert_person(&conn, "Anna");
    let ben = insert_person(&conn, "Ben");
    let service = CircleService::new(SqliteCircleRepository::try_new(&conn).unwrap());

    let root = service
        .create_circle(None, "Root", CircleDetails::default())
        .unwrap();
    let role = service.create_role(root.uuid, "Protokoll", None).unwrap();

    let first = service.assign_role(role.uuid, anna).unwrap();
    assert!(first.is_current());
    service.assign_role(role.uuid, ben).unwrap();
    assert_eq!(service.role_holders(role.uuid).unwrap(), vec![anna, ben]);

    service.end_role_assignment(first.uuid).unwrap();
    assert_eq!(service.role_holders(role.uuid).unwrap(), vec![ben]);

    let again = service.end_role_assignment(first.uuid).unwrap_err();
    assert_eq!(again.code(), "not_found");

    let missing_role = service.assign_role(Uuid::new_v4(), anna).unwrap_err();
    assert!(matches!(missing_role, CircleServiceError::RoleNotFound(_)));
}
