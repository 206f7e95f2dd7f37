//! Core logic for the Rollcall attendance page.
//! The live view, its change feeds and the submission path live here.

pub mod capability;
pub mod clock;
pub mod config;
pub mod db;
pub mod feed;
pub mod logging;
pub mod model;
pub mod page;
pub mod repo;
pub mod service;
pub mod view;

pub use capability::{Capabilities, CapabilityError, MediaFile, OptionalCapability};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_backend_config, BackendConfig, ConfigError};
pub use feed::live_query::LiveQuery;
pub use feed::scripted::ScriptedChangeSource;
pub use feed::subscription::Subscription;
pub use feed::{ChangeSource, FeedError, FeedResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::change::{ChangeBatch, ChangeKind, MalformedChange, RawChange, RecordChange};
pub use model::record::{DisplayFields, Record, RecordId, RecordValidationError};
pub use page::{AttendancePage, RefreshOutcome};
pub use repo::attendance_repo::{
    AttendanceRepository, RepoError, RepoResult, SqliteAttendanceRepository,
};
pub use repo::device_token_repo::SqliteDeviceTokenStore;
pub use service::attendance_service::{
    AttendanceForm, AttendanceService, SubmitError, Submitted,
};
pub use service::curriculum::{CurriculumError, CurriculumTab, CurriculumTabs, TabSelection};
pub use service::session::{AuthSession, HeaderState, Notice, SignedInUser};
pub use view::memory_sink::{MemorySink, SinkOp, SinkRow};
pub use view::reconciler::{ApplyOutcome, BatchReport, LiveViewReconciler};
pub use view::render::{MessageBody, RenderedSlot, Visibility};
pub use view::sink::{InsertPosition, PresentationSink};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
