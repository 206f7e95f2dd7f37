use rollcall_core::db::open_db_in_memory;
use rollcall_core::{
    AttendanceRepository, ChangeKind, ChangeSource, DisplayFields, LiveQuery, LiveViewReconciler,
    MalformedChange, ManualClock, MemorySink, Record, ScriptedChangeSource,
    SqliteAttendanceRepository, Subscription,
};

fn entry(name: &str, subject: &str) -> Record {
    Record::new(DisplayFields::attendance(name, subject, "21"))
}

fn kinds(source: &mut impl ChangeSource) -> Vec<ChangeKind> {
    source
        .poll()
        .unwrap()
        .changes
        .iter()
        .map(|change| change.kind)
        .collect()
}

#[test]
fn first_poll_is_the_ordered_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAttendanceRepository::new(&conn);
    repo.create_record(&entry("Late", "Maths").stamped(200)).unwrap();
    repo.create_record(&entry("Early", "Maths").stamped(100)).unwrap();

    let mut query = LiveQuery::new(SqliteAttendanceRepository::new(&conn));
    let batch = query.poll().unwrap();

    let names: Vec<_> = batch
        .changes
        .iter()
        .map(|change| change.record.as_ref().unwrap().fields.name.clone())
        .collect();
    assert_eq!(names, ["Early", "Late"]);
    assert!(batch
        .changes
        .iter()
        .all(|change| change.kind == ChangeKind::Inserted));
    assert!(query.poll().unwrap().is_empty());
}

#[test]
fn acknowledgement_arrives_as_modification() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAttendanceRepository::new(&conn);
    let mut query = LiveQuery::new(SqliteAttendanceRepository::new(&conn));
    assert!(query.poll().unwrap().is_empty());

    let pending = entry("Asha", "Python");
    repo.create_record(&pending).unwrap();
    let batch = query.poll().unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.changes[0].kind, ChangeKind::Inserted);
    assert_eq!(batch.changes[0].record.as_ref().unwrap().timestamp, None);

    assert_eq!(repo.stamp_pending(1_234).unwrap(), 1);
    let batch = query.poll().unwrap();
    assert_eq!(batch.changes[0].kind, ChangeKind::Modified);
    assert_eq!(batch.changes[0].record.as_ref().unwrap().timestamp, Some(1_234));
}

#[test]
fn deletes_surface_as_removals() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAttendanceRepository::new(&conn);
    let kept = entry("Kept", "TOC").stamped(1);
    let dropped = entry("Dropped", "TOC").stamped(2);
    repo.create_record(&kept).unwrap();
    repo.create_record(&dropped).unwrap();

    let mut query = LiveQuery::new(SqliteAttendanceRepository::new(&conn));
    query.poll().unwrap();
    repo.delete_record(&dropped.id).unwrap();

    assert_eq!(kinds(&mut query), [ChangeKind::Removed]);
    assert_eq!(query.snapshot().len(), 1);
}

#[test]
fn limited_query_evicts_rows_pushed_out_of_the_window() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAttendanceRepository::new(&conn);
    repo.create_record(&entry("b", "Maths").stamped(20)).unwrap();
    repo.create_record(&entry("c", "Maths").stamped(30)).unwrap();

    let mut query = LiveQuery::new(SqliteAttendanceRepository::new(&conn)).with_limit(2);
    query.poll().unwrap();

    repo.create_record(&entry("a", "Maths").stamped(10)).unwrap();
    assert_eq!(kinds(&mut query), [ChangeKind::Removed, ChangeKind::Inserted]);
}

#[test]
fn subscription_drives_view_until_unsubscribed() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAttendanceRepository::new(&conn);
    let clock = ManualClock::at(10);
    let mut view = LiveViewReconciler::new(MemorySink::new(), &clock);
    let mut subscription = Subscription::new(LiveQuery::new(SqliteAttendanceRepository::new(&conn)));

    repo.create_record(&entry("Asha", "Maths").stamped(5)).unwrap();
    let report = subscription.pump(&mut view).unwrap().expect("active subscription");
    assert_eq!(report.applied, 1);
    assert_eq!(view.len(), 1);

    subscription.unsubscribe();
    repo.create_record(&entry("Ravi", "Maths").stamped(6)).unwrap();
    assert!(subscription.pump(&mut view).unwrap().is_none());
    assert_eq!(view.len(), 1);
    assert_eq!(subscription.delivered_batches(), 1);
}

#[test]
fn scripted_source_replays_recorded_batches() {
    let mut source = ScriptedChangeSource::from_json_str(
        r#"[
            [
                {"type": "inserted", "identity": "a",
                 "record": {"name": "Alice", "text": "Alice", "rollno": "1", "timestamp": 100}},
                {"type": "inserted", "identity": "b",
                 "record": {"name": "Bob", "text": "Bob", "rollno": "2", "timestamp": 50}}
            ],
            [
                {"type": "modified", "identity": "a",
                 "record": {"name": "Alice", "text": "Alice2", "rollno": "1", "timestamp": 100}},
                {"type": "removed"},
                {"type": "removed", "identity": "b"}
            ]
        ]"#,
    )
    .unwrap();

    let mut view = LiveViewReconciler::new(MemorySink::new(), ManualClock::at(0));
    let mut subscription = Subscription::new(&mut source);
    let first = subscription.pump(&mut view).unwrap().unwrap();
    assert_eq!(first.applied, 2);
    let second = subscription.pump(&mut view).unwrap().unwrap();
    assert_eq!(second.applied, 2);
    assert_eq!(second.rejected.len(), 1);

    assert_eq!(view.sink().ids(), ["a"]);
}

#[test]
fn replay_skips_corrupt_events_and_keeps_the_rest() {
    let mut source = ScriptedChangeSource::from_json_str(
        r#"[
            [
                {"type": "inserted", "identity": "valid1",
                 "record": {"name": "A", "text": "Maths", "rollno": "1", "timestamp": 10}},
                {"type": "upserted"},
                {"type": "inserted", "identity": "bad",
                 "record": {"name": "B", "text": "Maths"}},
                {"type": "inserted", "identity": "valid2",
                 "record": {"name": "C", "text": "Maths", "rollno": "3", "timestamp": 20}}
            ],
            [
                {"type": "removed", "identity": "valid1"}
            ]
        ]"#,
    )
    .unwrap();
    assert_eq!(source.remaining(), 2);

    let mut view = LiveViewReconciler::new(MemorySink::new(), ManualClock::at(0));
    let mut subscription = Subscription::new(&mut source);
    let report = subscription.pump(&mut view).unwrap().unwrap();
    assert_eq!(report.applied, 2);
    assert_eq!(report.rejected.len(), 2);
    assert!(report
        .rejected
        .iter()
        .all(|err| matches!(err, MalformedChange::Undecodable { .. })));
    assert_eq!(view.sink().ids(), ["valid1", "valid2"]);

    let report = subscription.pump(&mut view).unwrap().unwrap();
    assert!(report.is_clean());
    assert_eq!(view.sink().ids(), ["valid2"]);
}
