use rollcall_core::capability::DeviceTokenSaver;
use rollcall_core::db::open_db_in_memory;
use rollcall_core::{
    AttendanceForm, AttendancePage, AttendanceRepository, AttendanceService, AuthSession,
    BackendConfig, BatchReport, Capabilities, CapabilityError, ConfigError, DisplayFields,
    ManualClock, MediaFile, MemorySink, Notice, OptionalCapability, Record, RecordId,
    RefreshOutcome, RepoError, RepoResult, SignedInUser, SqliteAttendanceRepository, SubmitError,
    Visibility,
};
use std::cell::RefCell;
use std::rc::Rc;

fn config() -> BackendConfig {
    BackendConfig {
        api_key: "key-123".to_string(),
        project_id: "attendance".to_string(),
        ..BackendConfig::default()
    }
}

fn applied(outcome: RefreshOutcome) -> BatchReport {
    match outcome {
        RefreshOutcome::Applied(report) => report,
        other => panic!("expected applied batch, got {other:?}"),
    }
}

#[test]
fn page_refuses_to_start_without_credentials() {
    let conn = open_db_in_memory().unwrap();
    let result = AttendancePage::start(
        BackendConfig::default(),
        &conn,
        MemorySink::new(),
        ManualClock::at(0),
    );
    assert!(matches!(result, Err(ConfigError::Missing { path: None })));
}

#[test]
fn submit_requires_sign_in_and_subject() {
    let conn = open_db_in_memory().unwrap();
    let service = AttendanceService::new(SqliteAttendanceRepository::new(&conn));
    let form = AttendanceForm::new("Maths", "12", "Asha");

    let err = service.submit(&AuthSession::new(), &form).unwrap_err();
    assert!(matches!(err, SubmitError::Notice(Notice::MustSignIn)));

    let session = AuthSession::signed_in(SignedInUser::new("Asha"));
    let err = service
        .submit(&session, &AttendanceForm::new(" ", "12", "Asha"))
        .unwrap_err();
    assert!(matches!(err, SubmitError::MissingSubject));

    assert!(service.repo().list_ordered(None).unwrap().is_empty());
}

#[test]
fn submit_stores_pending_document_with_profile_pic() {
    let conn = open_db_in_memory().unwrap();
    let service = AttendanceService::new(SqliteAttendanceRepository::new(&conn));
    let session = AuthSession::signed_in(SignedInUser::new("Asha").with_photo("/me.png"));

    let submitted = service
        .submit(&session, &AttendanceForm::new("Data Structure", " 12 ", "Asha K"))
        .unwrap();
    assert_eq!(submitted.notice, Notice::AttendanceCaptured);

    let stored = service.repo().get_record(&submitted.id).unwrap().unwrap();
    assert!(stored.is_pending());
    assert_eq!(stored.fields.text, "Data Structure");
    assert_eq!(stored.fields.rollno, "12");
    assert_eq!(stored.fields.name, "Asha K");
    assert_eq!(stored.fields.profile_pic_url.as_deref(), Some("/me.png"));

    assert_eq!(service.acknowledge_pending(5_000).unwrap(), 1);
    let stored = service.repo().get_record(&submitted.id).unwrap().unwrap();
    assert_eq!(stored.sort_key, Some(5_000));
}

struct RejectingRepo;

impl AttendanceRepository for RejectingRepo {
    fn create_record(&self, record: &Record) -> RepoResult<RecordId> {
        Err(RepoError::DuplicateId(record.id.clone()))
    }

    fn stamp_pending(&self, _server_ms: i64) -> RepoResult<usize> {
        Ok(0)
    }

    fn update_fields(&self, id: &RecordId, _fields: &DisplayFields) -> RepoResult<()> {
        Err(RepoError::NotFound(id.clone()))
    }

    fn get_record(&self, _id: &RecordId) -> RepoResult<Option<Record>> {
        Ok(None)
    }

    fn list_ordered(&self, _limit: Option<u32>) -> RepoResult<Vec<Record>> {
        Ok(Vec::new())
    }

    fn delete_record(&self, id: &RecordId) -> RepoResult<()> {
        Err(RepoError::NotFound(id.clone()))
    }
}

#[test]
fn write_failure_is_returned_and_retry_is_possible() {
    let service = AttendanceService::new(RejectingRepo);
    let session = AuthSession::signed_in(SignedInUser::new("Asha"));
    let form = AttendanceForm::new("Maths", "1", "Asha");

    for _ in 0..2 {
        let err = service.submit(&session, &form).unwrap_err();
        assert!(matches!(err, SubmitError::Write(RepoError::DuplicateId(_))));
        assert!(err.to_string().starts_with("error writing attendance record"));
    }
}

#[test]
fn media_must_be_an_image_and_needs_a_capability() {
    let conn = open_db_in_memory().unwrap();
    let service = AttendanceService::new(SqliteAttendanceRepository::new(&conn));
    let session = AuthSession::signed_in(SignedInUser::new("Asha"));
    let capabilities = Capabilities::new();

    let pdf = MediaFile {
        name: "notes.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        bytes: Vec::new(),
    };
    let err = service
        .submit_image(&session, &pdf, &capabilities)
        .unwrap_err();
    assert!(matches!(err, SubmitError::Notice(Notice::ImagesOnly)));

    let png = MediaFile {
        name: "selfie.png".to_string(),
        mime_type: "image/png".to_string(),
        bytes: vec![0x89],
    };
    let err = service
        .submit_image(&session, &png, &capabilities)
        .unwrap_err();
    assert!(matches!(
        err,
        SubmitError::Capability(CapabilityError::NotProvided(
            OptionalCapability::ImageMessage
        ))
    ));
}

#[test]
fn page_renders_only_for_signed_in_users() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAttendanceRepository::new(&conn);
    repo.create_record(&Record::new(DisplayFields::attendance("Asha", "Maths", "1")).stamped(10))
        .unwrap();

    let mut page =
        AttendancePage::start(config(), &conn, MemorySink::new(), ManualClock::at(100)).unwrap();
    assert_eq!(page.refresh().unwrap(), RefreshOutcome::SignInRequired);
    assert!(page.view().is_empty());

    page.sign_in(SignedInUser::new("Ravi"));
    let report = applied(page.refresh().unwrap());
    assert_eq!(report.applied, 1);
    assert_eq!(page.view().len(), 1);
}

#[test]
fn submitted_entry_flows_through_to_the_table() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::at(1_000);
    let mut page = AttendancePage::start(config(), &conn, MemorySink::new(), &clock).unwrap();
    let header = page.sign_in(SignedInUser::new("Asha"));
    assert!(header.sign_out_visible);

    let submitted = page
        .submit(&AttendanceForm::new("Python", "7", "Asha"))
        .unwrap();
    applied(page.refresh().unwrap());
    let row = page.view().sink().row(&submitted.id).unwrap();
    assert_eq!(row.slot.sort_key, 1_000);
    assert_eq!(row.slot.visibility, Visibility::Pending);

    assert_eq!(page.tick(), 1);
    clock.advance(250);
    assert_eq!(page.acknowledge_pending_writes().unwrap(), 1);
    let report = applied(page.refresh().unwrap());
    assert_eq!(report.applied, 1);

    let row = page.view().sink().row(&submitted.id).unwrap();
    assert_eq!(row.slot.sort_key, 1_250);
    assert_eq!(row.slot.visibility, Visibility::Visible);

    page.delete(&submitted.id).unwrap();
    applied(page.refresh().unwrap());
    assert!(page.view().is_empty());
}

#[test]
fn tab_selection_filters_rows_by_subject() {
    let conn = open_db_in_memory().unwrap();
    let mut page =
        AttendancePage::start(config(), &conn, MemorySink::new(), ManualClock::at(0)).unwrap();
    page.sign_in(SignedInUser::new("Asha"));
    for subject in ["Maths", "Data Structure", "TOC"] {
        page.submit(&AttendanceForm::new(subject, "1", "Asha")).unwrap();
    }
    applied(page.refresh().unwrap());

    page.select_tab("datastructure").unwrap();
    let visible: Vec<_> = page
        .view()
        .sink()
        .rows()
        .iter()
        .filter(|row| page.is_row_visible(&row.slot.row_class))
        .map(|row| row.slot.name.clone() + "/" + &row.slot.row_class)
        .collect();
    assert_eq!(visible, ["Asha/datastructure"]);
    assert!(page.select_tab("history").is_err());
}

#[test]
fn closed_page_stops_receiving_changes() {
    let conn = open_db_in_memory().unwrap();
    let mut page =
        AttendancePage::start(config(), &conn, MemorySink::new(), ManualClock::at(0)).unwrap();
    page.sign_in(SignedInUser::new("Asha"));
    page.submit(&AttendanceForm::new("Maths", "1", "Asha")).unwrap();
    applied(page.refresh().unwrap());

    page.close();
    page.submit(&AttendanceForm::new("TOC", "2", "Ravi")).unwrap();
    assert_eq!(page.refresh().unwrap(), RefreshOutcome::Unsubscribed);
    assert_eq!(page.view().len(), 1);
}

struct RecordingTokens(Rc<RefCell<Vec<(String, String)>>>);

impl DeviceTokenSaver for RecordingTokens {
    fn save_device_token(&self, user_name: &str, token: &str) -> Result<(), CapabilityError> {
        self.0
            .borrow_mut()
            .push((user_name.to_string(), token.to_string()));
        Ok(())
    }
}

#[test]
fn sign_in_saves_device_token_when_capability_is_registered() {
    let conn = open_db_in_memory().unwrap();
    let saved = Rc::new(RefCell::new(Vec::new()));
    let mut page = AttendancePage::start(config(), &conn, MemorySink::new(), ManualClock::at(0))
        .unwrap()
        .with_capabilities(
            Capabilities::new().with_device_token(RecordingTokens(saved.clone()), "device-abc"),
        );

    page.sign_in(SignedInUser::new("Asha"));
    assert!(page.session().is_signed_in());
    assert_eq!(
        saved.borrow().as_slice(),
        [("Asha".to_string(), "device-abc".to_string())]
    );

    let header = page.sign_out();
    assert!(header.sign_in_visible);
}
