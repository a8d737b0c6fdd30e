//! Provisioning API abstraction
//!
//! The workflow only depends on [`ProvisioningApi`], so tests can drive it with
//! a mock while the binary plugs in the HTTP client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::ValidatedPassword;
use crate::workflows::DeviceIdentifier;

#[cfg(test)]
use mockall::automock;

/// Body of `POST devices/{id}/set-password`.
#[derive(Debug, Serialize)]
pub struct SetPasswordRequest<'a> {
    pub password: &'a str,
}

/// Response of the provisioning endpoint.
///
/// `success` is mandatory; a body without it does not deserialize and is
/// reported as [`ApiError::MalformedResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ProvisioningResponse {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            code: None,
            error_message: None,
        }
    }

    pub fn rejected(code: Option<&str>, error_message: &str) -> Self {
        Self {
            success: false,
            code: code.map(str::to_string),
            error_message: Some(error_message.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid provisioning base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("Provisioning request failed: {source}")]
    Request {
        #[from]
        source: reqwest::Error,
    },
    #[error("Malformed provisioning response (HTTP {status}): {source}")]
    MalformedResponse {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
    #[error("Provisioning transport error: {message}")]
    Transport { message: String },
}

/// Trait for the device provisioning endpoint
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProvisioningApi: Send + Sync {
    /// Set the access credential of `device` to `password`
    async fn set_password(
        &self,
        device: &DeviceIdentifier,
        password: &ValidatedPassword,
    ) -> Result<ProvisioningResponse, ApiError>;
}
