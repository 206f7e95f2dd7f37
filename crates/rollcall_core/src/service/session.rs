//! Signed-in user session and the header projection derived from it.

use crate::view::render::sized_profile_pic_url;
use log::info;

/// Placeholder shown when the user has no profile picture.
pub const PROFILE_PLACEHOLDER_URL: &str = "/images/profile_placeholder.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedInUser {
    pub display_name: String,
    pub photo_url: Option<String>,
}

impl SignedInUser {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            photo_url: None,
        }
    }

    pub fn with_photo(mut self, photo_url: impl Into<String>) -> Self {
        self.photo_url = Some(photo_url.into());
        self
    }
}

/// Visibility of the header controls for the current auth state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderState {
    pub user_name: Option<String>,
    pub user_pic_url: Option<String>,
    pub sign_in_visible: bool,
    pub sign_out_visible: bool,
}

/// Advisory, non-blocking message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    MustSignIn,
    ImagesOnly,
    AttendanceCaptured,
}

impl Notice {
    pub const TIMEOUT_MS: u64 = 2000;

    pub fn message(self) -> &'static str {
        match self {
            Self::MustSignIn => "You must sign-in first",
            Self::ImagesOnly => "You can only share images",
            Self::AttendanceCaptured => "Your attendance is captured successfully!!",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    user: Option<SignedInUser>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user: SignedInUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn sign_in(&mut self, user: SignedInUser) -> HeaderState {
        info!(
            "event=sign_in module=session status=ok user={}",
            user.display_name
        );
        self.user = Some(user);
        self.header_state()
    }

    pub fn sign_out(&mut self) -> HeaderState {
        if self.user.take().is_some() {
            info!("event=sign_out module=session status=ok");
        }
        self.header_state()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&SignedInUser> {
        self.user.as_ref()
    }

    /// Returns the user, or the notice to show when nobody is signed in.
    pub fn require_signed_in(&self) -> Result<&SignedInUser, Notice> {
        self.user.as_ref().ok_or(Notice::MustSignIn)
    }

    /// Profile picture to stamp on submissions.
    pub fn profile_pic_url(&self) -> String {
        self.user
            .as_ref()
            .and_then(|user| user.photo_url.clone())
            .unwrap_or_else(|| PROFILE_PLACEHOLDER_URL.to_string())
    }

    pub fn header_state(&self) -> HeaderState {
        match &self.user {
            Some(user) => HeaderState {
                user_name: Some(user.display_name.clone()),
                user_pic_url: Some(sized_profile_pic_url(&self.profile_pic_url())),
                sign_in_visible: false,
                sign_out_visible: true,
            },
            None => HeaderState {
                user_name: None,
                user_pic_url: None,
                sign_in_visible: true,
                sign_out_visible: false,
            },
        }
    }
}
