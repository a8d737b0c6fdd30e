// Core value types shared by the provisioning workflow and its collaborators

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message recorded when the provisioning call never produced a usable response.
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "The device could not be reached or sent an unreadable response. Please try again.";

/// Message recorded when the device rejects the request without explaining why.
pub const UNSPECIFIED_REJECTION_MESSAGE: &str = "The device rejected the new PIN.";

/// Opaque identifier of the device whose credential is being provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentifier(String);

impl DeviceIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceIdentifier {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DeviceIdentifier {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Pending,
    Failed,
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SubmissionStatus::Idle => "idle",
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Failure recorded while the workflow sits in `Failed`.
///
/// `code` is the server-supplied identifier (when any) used to look up a
/// localized message; `message` is the text shown when no localization exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningError {
    pub code: Option<String>,
    pub message: String,
}

impl ProvisioningError {
    pub fn rejected(code: Option<String>, message: Option<String>) -> Self {
        Self {
            code: code.filter(|c| !c.is_empty()),
            message: message.unwrap_or_else(|| UNSPECIFIED_REJECTION_MESSAGE.to_string()),
        }
    }

    pub fn transport() -> Self {
        Self {
            code: None,
            message: TRANSPORT_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl fmt::Display for ProvisioningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}
