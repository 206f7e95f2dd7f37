//! Attendance page context.
//!
//! # Responsibility
//! - Build every collaborator of the page once at startup and hand them to
//!   the handlers explicitly.
//! - Route user actions (sign-in, submit, tab clicks) and feed refreshes.
//!
//! # Invariants
//! - A page only exists with a validated backend configuration.
//! - Rows are only rendered while a user is signed in; refreshes attempted
//!   while signed out leave the feed untouched so nothing is lost.

use crate::capability::{Capabilities, CapabilityError, MediaFile};
use crate::clock::Clock;
use crate::config::{BackendConfig, ConfigError};
use crate::feed::live_query::LiveQuery;
use crate::feed::subscription::Subscription;
use crate::feed::FeedResult;
use crate::model::record::RecordId;
use crate::repo::attendance_repo::{RepoResult, SqliteAttendanceRepository};
use crate::service::attendance_service::{AttendanceForm, AttendanceService, SubmitError, Submitted};
use crate::service::curriculum::{CurriculumError, CurriculumTabs, TabSelection};
use crate::service::session::{AuthSession, HeaderState, SignedInUser};
use crate::view::reconciler::{BatchReport, LiveViewReconciler};
use crate::view::sink::PresentationSink;
use log::{debug, info, warn};
use rusqlite::Connection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied(BatchReport),
    SignInRequired,
    Unsubscribed,
}

pub struct AttendancePage<'conn, K, C> {
    config: BackendConfig,
    session: AuthSession,
    service: AttendanceService<SqliteAttendanceRepository<'conn>>,
    subscription: Subscription<LiveQuery<SqliteAttendanceRepository<'conn>>>,
    view: LiveViewReconciler<K, C>,
    tabs: CurriculumTabs,
    capabilities: Capabilities,
}

impl<'conn, K: PresentationSink, C: Clock> AttendancePage<'conn, K, C> {
    /// Starts the page against a migrated connection.
    ///
    /// # Errors
    /// - `ConfigError::Missing` when the configuration has no credentials.
    pub fn start(
        config: BackendConfig,
        conn: &'conn Connection,
        sink: K,
        clock: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            "event=page_start module=page status=ok project_id={}",
            config.project_id
        );

        Ok(Self {
            config,
            session: AuthSession::new(),
            service: AttendanceService::new(SqliteAttendanceRepository::new(conn)),
            subscription: Subscription::new(LiveQuery::new(SqliteAttendanceRepository::new(conn))),
            view: LiveViewReconciler::new(sink, clock),
            tabs: CurriculumTabs::default(),
            capabilities: Capabilities::new(),
        })
    }

    pub fn with_tabs(mut self, tabs: CurriculumTabs) -> Self {
        self.tabs = tabs;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Signs in and saves the device token when that capability exists.
    pub fn sign_in(&mut self, user: SignedInUser) -> HeaderState {
        let header = self.session.sign_in(user);
        if let Some(user) = self.session.user() {
            match self.capabilities.save_device_token(&user.display_name) {
                Ok(()) => {}
                Err(CapabilityError::NotProvided(capability)) => debug!(
                    "event=capability_skip module=page status=ok capability={}",
                    capability.as_str()
                ),
                Err(err) => warn!("event=device_token_save module=page status=error error={err}"),
            }
        }
        header
    }

    pub fn sign_out(&mut self) -> HeaderState {
        self.session.sign_out()
    }

    pub fn submit(&self, form: &AttendanceForm) -> Result<Submitted, SubmitError> {
        self.service.submit(&self.session, form)
    }

    pub fn submit_image(&self, file: &MediaFile) -> Result<RecordId, SubmitError> {
        self.service
            .submit_image(&self.session, file, &self.capabilities)
    }

    /// Lets the store assign server timestamps to pending writes.
    pub fn acknowledge_pending_writes(&self) -> RepoResult<usize> {
        self.service.acknowledge_pending(self.view.clock().now_ms())
    }

    pub fn delete(&self, id: &RecordId) -> RepoResult<()> {
        self.service.delete(id)
    }

    /// Pulls the next change batch into the view.
    pub fn refresh(&mut self) -> FeedResult<RefreshOutcome> {
        if !self.subscription.is_active() {
            return Ok(RefreshOutcome::Unsubscribed);
        }
        if !self.session.is_signed_in() {
            return Ok(RefreshOutcome::SignInRequired);
        }
        match self.subscription.pump(&mut self.view)? {
            Some(report) => Ok(RefreshOutcome::Applied(report)),
            None => Ok(RefreshOutcome::Unsubscribed),
        }
    }

    pub fn tick(&mut self) -> usize {
        self.view.tick()
    }

    pub fn select_tab(&mut self, tab_id: &str) -> Result<TabSelection, CurriculumError> {
        self.tabs.select(tab_id)
    }

    pub fn is_row_visible(&self, row_class: &str) -> bool {
        self.tabs.is_row_visible(row_class)
    }

    /// Stops the live feed. Rendered rows stay.
    pub fn close(&mut self) {
        self.subscription.unsubscribe();
    }

    pub fn view(&self) -> &LiveViewReconciler<K, C> {
        &self.view
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn tabs(&self) -> &CurriculumTabs {
        &self.tabs
    }
}
