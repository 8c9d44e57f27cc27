use std::time::{Duration, Instant};

use circleboard_core::db::open_db_in_memory;
use circleboard_core::model::meeting::{MeetingPhase, MeetingStatus, MeetingType, RoundPhase};
use circleboard_core::repo::meeting_repo::{NewAgendaItem, SqliteMeetingRepository};
use circleboard_core::{
    Actor, ChangeFeed, ChangeNotification, ChangeSlice, DraftStatus, LiveMeetingSession,
    LiveMeetingState, MeetingService, OutcomeDraft, PendingAction, SessionError,
};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> (Connection, Uuid, Actor, Actor) {
    let conn = open_db_in_memory().unwrap();
    let circle = Uuid::new_v4();
    conn.execute(
        "INSERT INTO circles (uuid, name) VALUES (?1, 'Förderverein');",
        [circle.to_string()],
    )
    .unwrap();
    let facilitator = insert_person(&conn, "Frieda");
    let member = insert_person(&conn, "Max");
    (conn, circle, Actor::member(facilitator), Actor::member(member))
}

fn insert_person(conn: &Connection, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO people (uuid, display_name) VALUES (?1, ?2);",
        rusqlite::params![id.to_string(), name],
    )
    .unwrap();
    id
}

fn titled(title: &str) -> NewAgendaItem {
    NewAgendaItem {
        title: Some(title.to_string()),
        ..NewAgendaItem::default()
    }
}

#[test]
fn auto_join_fires_once_for_active_meeting() {
    let (conn, circle, facilitator, member) = setup();
    let feed = ChangeFeed::default();
    let service =
        MeetingService::new(SqliteMeetingRepository::try_new(&conn).unwrap()).with_feed(feed.clone());
    let meeting = service
        .create_meeting(circle, MeetingType::Tactical, 0, Some(facilitator.person_uuid))
        .unwrap();

    let mut session = LiveMeetingSession::open(&service, &feed, member, meeting.uuid).unwrap();
    assert!(!session.auto_join(&service).unwrap());
    assert!(!session.auto_join_attempted());

    service.start_meeting(&facilitator, meeting.uuid).unwrap();
    session.sync(&service).unwrap();
    assert_eq!(session.state().status(), MeetingStatus::Active);

    assert!(session.auto_join(&service).unwrap());
    assert!(session.auto_join_attempted());
    assert!(session.state().is_attendee(member.person_uuid));

    assert!(!session.auto_join(&service).unwrap());
    let rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM meeting_attendees WHERE meeting_uuid = ?1;",
            [meeting.uuid.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn failed_auto_join_is_not_retried() {
    let (conn, circle, facilitator, _) = setup();
    let feed = ChangeFeed::default();
    let service =
        MeetingService::new(SqliteMeetingRepository::try_new(&conn).unwrap()).with_feed(feed.clone());
    let meeting = service
        .create_meeting(circle, MeetingType::Tactical, 0, Some(facilitator.person_uuid))
        .unwrap();
    service.start_meeting(&facilitator, meeting.uuid).unwrap();

    // Unknown person: the attendee insert violates the foreign key.
    let stranger = Actor::member(Uuid::new_v4());
    let mut session = LiveMeetingSession::open(&service, &feed, stranger, meeting.uuid).unwrap();

    let err = session.auto_join(&service).unwrap_err();
    assert!(matches!(err, SessionError::Service(_)));
    assert!(session.auto_join_attempted());
    assert!(!session.is_pending(PendingAction::Join));

    assert!(!session.auto_join(&service).unwrap());
    assert!(!session.state().is_attendee(stranger.person_uuid));
}

#[test]
fn notifications_merge_changes_from_other_participants() {
    let (conn, circle, facilitator, member) = setup();
    let feed = ChangeFeed::default();
    let service =
        MeetingService::new(SqliteMeetingRepository::try_new(&conn).unwrap()).with_feed(feed.clone());
    let meeting = service
        .create_meeting(circle, MeetingType::Tactical, 0, Some(facilitator.person_uuid))
        .unwrap();
    let item = service.add_agenda_item(meeting.uuid, titled("Spendenlauf")).unwrap();

    let mut watcher = LiveMeetingSession::open(&service, &feed, member, meeting.uuid).unwrap();
    assert_eq!(watcher.state().agenda_items().len(), 1);

    service.start_meeting(&facilitator, meeting.uuid).unwrap();
    service.join_meeting(&facilitator, meeting.uuid).unwrap();
    service
        .save_round_entry(&facilitator, meeting.uuid, RoundPhase::CheckIn, "gut gelaunt")
        .unwrap();
    service
        .add_agenda_comment(&facilitator, item.uuid, "Strecke steht")
        .unwrap();
    service.add_agenda_item(meeting.uuid, titled("Kuchenbuffet")).unwrap();

    let applied = watcher.sync(&service).unwrap();
    assert!(applied >= 4);

    let state = watcher.state();
    assert_eq!(state.current_phase(), Some(MeetingPhase::CheckIn));
    assert_eq!(state.current_agenda_position(), Some(1));
    assert!(state.is_attendee(facilitator.person_uuid));
    assert_eq!(
        state
            .round_entry_of(facilitator.person_uuid, RoundPhase::CheckIn)
            .map(|entry| entry.content.as_str()),
        Some("gut gelaunt")
    );
    let titles: Vec<_> = state
        .agenda_items()
        .iter()
        .map(|item| item.title.clone().unwrap_or_default())
        .collect();
    assert_eq!(titles, vec!["Spendenlauf", "Kuchenbuffet"]);
    assert_eq!(state.agenda_items()[0].comments.len(), 1);
    assert_eq!(state.current_item().map(|item| item.uuid), Some(item.uuid));

    assert_eq!(watcher.sync(&service).unwrap(), 0);
}

#[test]
fn notifications_for_other_meetings_are_ignored() {
    let (conn, circle, facilitator, member) = setup();
    let feed = ChangeFeed::default();
    let service =
        MeetingService::new(SqliteMeetingRepository::try_new(&conn).unwrap()).with_feed(feed.clone());
    let watched = service
        .create_meeting(circle, MeetingType::Tactical, 0, Some(facilitator.person_uuid))
        .unwrap();
    let other = service
        .create_meeting(circle, MeetingType::Governance, 0, Some(facilitator.person_uuid))
        .unwrap();

    let mut session = LiveMeetingSession::open(&service, &feed, member, watched.uuid).unwrap();
    service.start_meeting(&facilitator, other.uuid).unwrap();
    service.add_agenda_item(other.uuid, titled("Fremd")).unwrap();

    assert_eq!(session.sync(&service).unwrap(), 0);
    assert_eq!(session.state().status(), MeetingStatus::Scheduled);
    assert!(session.state().agenda_items().is_empty());

    let mut state = LiveMeetingState::load(service.repo(), watched.uuid).unwrap();
    let foreign = ChangeNotification::new(other.uuid, ChangeSlice::Full);
    assert!(!state.apply(service.repo(), &foreign).unwrap());
}

#[test]
fn lagging_subscriber_resyncs_fully() {
    let (conn, circle, facilitator, member) = setup();
    let feed = ChangeFeed::new(2);
    let service =
        MeetingService::new(SqliteMeetingRepository::try_new(&conn).unwrap()).with_feed(feed.clone());
    let meeting = service
        .create_meeting(circle, MeetingType::Tactical, 0, Some(facilitator.person_uuid))
        .unwrap();

    let mut session = LiveMeetingSession::open(&service, &feed, member, meeting.uuid).unwrap();
    for title in ["Eins", "Zwei", "Drei", "Vier", "Fünf"] {
        service.add_agenda_item(meeting.uuid, titled(title)).unwrap();
    }
    service.start_meeting(&facilitator, meeting.uuid).unwrap();

    assert_eq!(session.sync(&service).unwrap(), 1);
    let state = session.state();
    assert_eq!(state.agenda_items().len(), 5);
    assert_eq!(state.status(), MeetingStatus::Active);
    assert_eq!(state.unprocessed_count(), 5);
}

#[test]
fn pending_action_blocks_duplicate_dispatch() {
    let (conn, circle, facilitator, _) = setup();
    let feed = ChangeFeed::default();
    let service =
        MeetingService::new(SqliteMeetingRepository::try_new(&conn).unwrap()).with_feed(feed.clone());
    let meeting = service
        .create_meeting(circle, MeetingType::Tactical, 0, Some(facilitator.person_uuid))
        .unwrap();
    service.start_meeting(&facilitator, meeting.uuid).unwrap();

    let mut session = LiveMeetingSession::open(&service, &feed, facilitator, meeting.uuid).unwrap();
    session.begin(PendingAction::AdvancePhase).unwrap();
    let err = session.advance_phase(&service).unwrap_err();
    assert!(matches!(
        err,
        SessionError::ActionPending(PendingAction::AdvancePhase)
    ));
    assert_eq!(err.code(), "transient");
    assert_eq!(
        service.get_meeting(meeting.uuid).unwrap().current_phase,
        Some(MeetingPhase::CheckIn)
    );

    session.finish(PendingAction::AdvancePhase);
    let advance = session.advance_phase(&service).unwrap();
    assert_eq!(advance.previous, MeetingPhase::CheckIn);
    assert_eq!(session.state().current_phase(), Some(MeetingPhase::Agenda));
    assert!(!session.is_pending(PendingAction::AdvancePhase));
}

#[test]
fn debounced_outcome_draft_saves_through_session() {
    let (conn, circle, facilitator, member) = setup();
    let feed = ChangeFeed::default();
    let service =
        MeetingService::new(SqliteMeetingRepository::try_new(&conn).unwrap()).with_feed(feed.clone());
    let meeting = service
        .create_meeting(circle, MeetingType::Tactical, 0, Some(facilitator.person_uuid))
        .unwrap();
    let item = service.add_agenda_item(meeting.uuid, titled("Beitrag")).unwrap();
    service.start_meeting(&facilitator, meeting.uuid).unwrap();

    let mut session = LiveMeetingSession::open(&service, &feed, facilitator, meeting.uuid).unwrap();
    let mut watcher = LiveMeetingSession::open(&service, &feed, member, meeting.uuid).unwrap();

    let debounce = Duration::from_millis(800);
    let mut draft = OutcomeDraft::new(item.uuid, None, debounce);
    let start = Instant::now();
    draft.edit("Beitrag bleibt", start);
    draft.edit("Beitrag bleibt bei 20 Euro", start + Duration::from_millis(300));
    assert_eq!(draft.status(), DraftStatus::Unsaved);

    let early = draft.poll(start + Duration::from_millis(900), |text| {
        session.save_outcome(&service, item.uuid, Some(text.to_string()))
    });
    assert!(early.is_none());

    let saved = draft.poll(start + Duration::from_millis(1_200), |text| {
        session.save_outcome(&service, item.uuid, Some(text.to_string()))
    });
    assert!(matches!(saved, Some(Ok(()))));
    assert_eq!(draft.status(), DraftStatus::Saved);
    assert_eq!(
        session.state().agenda_items()[0].outcome.as_deref(),
        Some("Beitrag bleibt bei 20 Euro")
    );

    watcher.sync(&service).unwrap();
    let remote = watcher.state().agenda_items()[0].outcome.clone();
    let mut watcher_draft = OutcomeDraft::new(item.uuid, None, debounce);
    watcher_draft.apply_remote(remote.as_deref());
    assert_eq!(watcher_draft.text(), "Beitrag bleibt bei 20 Euro");
    assert!(!watcher.state().agenda_items()[0].is_processed);
}

#[test]
fn failed_refetch_is_recovered_by_next_sync() {
    let (conn, circle, facilitator, member) = setup();
    let feed = ChangeFeed::default();
    let service =
        MeetingService::new(SqliteMeetingRepository::try_new(&conn).unwrap()).with_feed(feed.clone());
    let meeting = service
        .create_meeting(circle, MeetingType::Tactical, 0, Some(facilitator.person_uuid))
        .unwrap();
    service.start_meeting(&facilitator, meeting.uuid).unwrap();

    let mut watcher = LiveMeetingSession::open(&service, &feed, member, meeting.uuid).unwrap();
    service.join_meeting(&facilitator, meeting.uuid).unwrap();
    service.advance_phase(&facilitator, meeting.uuid).unwrap();

    conn.execute_batch("ALTER TABLE meeting_attendees RENAME TO meeting_attendees_offline;")
        .unwrap();
    let err = watcher.sync(&service).unwrap_err();
    assert_eq!(err.code(), "transient");
    assert!(watcher.needs_full_resync());
    conn.execute_batch("ALTER TABLE meeting_attendees_offline RENAME TO meeting_attendees;")
        .unwrap();

    assert_eq!(watcher.sync(&service).unwrap(), 1);
    assert!(!watcher.needs_full_resync());
    assert_eq!(watcher.state().current_phase(), Some(MeetingPhase::Agenda));
    assert!(watcher.state().is_attendee(facilitator.person_uuid));
    assert_eq!(
        watcher.state().current_phase(),
        service.get_meeting(meeting.uuid).unwrap().current_phase
    );
}
