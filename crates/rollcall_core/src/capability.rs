//! Optional backend capabilities the attendance page can run without.
//!
//! # Responsibility
//! - Name the capabilities that live outside the core (image messages,
//!   messaging device tokens, notification permission).
//! - Hold whichever implementations the host provides and report the rest
//!   as unavailable.
//!
//! # Invariants
//! - The live view never depends on any capability here.
//! - An absent capability is an error value, never a panic.

use crate::model::record::RecordId;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static IMAGE_MIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"image.*").expect("valid image mime regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionalCapability {
    ImageMessage,
    DeviceToken,
    NotificationPermission,
}

impl OptionalCapability {
    pub const ALL: [OptionalCapability; 3] = [
        Self::ImageMessage,
        Self::DeviceToken,
        Self::NotificationPermission,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ImageMessage => "image_message",
            Self::DeviceToken => "device_token",
            Self::NotificationPermission => "notification_permission",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::ImageMessage => "Upload an image and post it as an attendance message.",
            Self::DeviceToken => "Save the messaging device token for the signed-in user.",
            Self::NotificationPermission => "Ask the user for permission to show notifications.",
        }
    }
}

/// File picked through the media capture control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    /// Returns whether the picker gave us something shareable as an image.
    pub fn is_image(&self) -> bool {
        IMAGE_MIME_RE.is_match(&self.mime_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    NotProvided(OptionalCapability),
    Rejected {
        capability: OptionalCapability,
        message: String,
    },
}

impl Display for CapabilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotProvided(capability) => {
                write!(f, "capability not provided: {}", capability.as_str())
            }
            Self::Rejected {
                capability,
                message,
            } => write!(f, "{} failed: {message}", capability.as_str()),
        }
    }
}

impl Error for CapabilityError {}

/// Posts an image as a new attendance message.
pub trait ImageMessageSaver {
    fn save_image_message(
        &self,
        user_name: &str,
        file: &MediaFile,
    ) -> Result<RecordId, CapabilityError>;
}

/// Persists the messaging device token for a user.
pub trait DeviceTokenSaver {
    fn save_device_token(&self, user_name: &str, token: &str) -> Result<(), CapabilityError>;
}

/// Requests permission to show notifications. `Ok(false)` means declined.
pub trait NotificationPermission {
    fn request_permission(&self) -> Result<bool, CapabilityError>;
}

/// Host-provided capability implementations.
#[derive(Default)]
pub struct Capabilities {
    image_message: Option<Box<dyn ImageMessageSaver>>,
    device_token: Option<(Box<dyn DeviceTokenSaver>, String)>,
    notification_permission: Option<Box<dyn NotificationPermission>>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image_messages(mut self, saver: impl ImageMessageSaver + 'static) -> Self {
        self.image_message = Some(Box::new(saver));
        self
    }

    /// Registers a token saver together with the token this device holds.
    pub fn with_device_token(
        mut self,
        saver: impl DeviceTokenSaver + 'static,
        token: impl Into<String>,
    ) -> Self {
        self.device_token = Some((Box::new(saver), token.into()));
        self
    }

    pub fn with_notification_permission(
        mut self,
        permission: impl NotificationPermission + 'static,
    ) -> Self {
        self.notification_permission = Some(Box::new(permission));
        self
    }

    pub fn is_provided(&self, capability: OptionalCapability) -> bool {
        match capability {
            OptionalCapability::ImageMessage => self.image_message.is_some(),
            OptionalCapability::DeviceToken => self.device_token.is_some(),
            OptionalCapability::NotificationPermission => self.notification_permission.is_some(),
        }
    }

    pub fn save_image_message(
        &self,
        user_name: &str,
        file: &MediaFile,
    ) -> Result<RecordId, CapabilityError> {
        self.image_message
            .as_ref()
            .ok_or(CapabilityError::NotProvided(OptionalCapability::ImageMessage))?
            .save_image_message(user_name, file)
    }

    pub fn save_device_token(&self, user_name: &str) -> Result<(), CapabilityError> {
        let (saver, token) = self
            .device_token
            .as_ref()
            .ok_or(CapabilityError::NotProvided(OptionalCapability::DeviceToken))?;
        saver.save_device_token(user_name, token)
    }

    pub fn request_notification_permission(&self) -> Result<bool, CapabilityError> {
        self.notification_permission
            .as_ref()
            .ok_or(CapabilityError::NotProvided(
                OptionalCapability::NotificationPermission,
            ))?
            .request_permission()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Capabilities, CapabilityError, MediaFile, NotificationPermission, OptionalCapability,
    };

    struct AlwaysGrant;

    impl NotificationPermission for AlwaysGrant {
        fn request_permission(&self) -> Result<bool, CapabilityError> {
            Ok(true)
        }
    }

    fn file(mime_type: &str) -> MediaFile {
        MediaFile {
            name: "upload".to_string(),
            mime_type: mime_type.to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn media_file_accepts_only_image_types() {
        assert!(file("image/png").is_image());
        assert!(file("image/jpeg").is_image());
        assert!(!file("application/pdf").is_image());
        assert!(!file("").is_image());
    }

    #[test]
    fn empty_registry_reports_every_capability_missing() {
        let capabilities = Capabilities::new();
        for capability in OptionalCapability::ALL {
            assert!(!capabilities.is_provided(capability));
        }
        assert_eq!(
            capabilities.save_device_token("Asha"),
            Err(CapabilityError::NotProvided(OptionalCapability::DeviceToken))
        );
        assert_eq!(
            capabilities.save_image_message("Asha", &file("image/png")),
            Err(CapabilityError::NotProvided(OptionalCapability::ImageMessage))
        );
    }

    #[test]
    fn registered_capability_is_invoked() {
        let capabilities = Capabilities::new().with_notification_permission(AlwaysGrant);
        assert!(capabilities.is_provided(OptionalCapability::NotificationPermission));
        assert_eq!(capabilities.request_notification_permission(), Ok(true));
    }

    #[test]
    fn descriptions_mention_their_concern() {
        assert!(OptionalCapability::ImageMessage
            .description()
            .contains("image"));
        assert!(OptionalCapability::DeviceToken
            .description()
            .contains("token"));
        assert!(OptionalCapability::NotificationPermission
            .description()
            .contains("notifications"));
    }
}
