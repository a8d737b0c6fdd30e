use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::external::{ApiError, ProvisioningApi, ProvisioningResponse, SetPasswordRequest};
use crate::validation::ValidatedPassword;
use crate::workflows::DeviceIdentifier;

/// Provisioning client that talks JSON over HTTP to the device backend
#[derive(Debug, Clone)]
pub struct HttpProvisioningApi {
    client: Client,
    base_url: Url,
}

impl HttpProvisioningApi {
    /// Create a client rooted at `base_url` (e.g. `http://localhost:8082/api/`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_seconds))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base_url}/devices/{device}/set-password`, with the device id encoded as one segment
    pub fn endpoint(&self, device: &DeviceIdentifier) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            })?
            .pop_if_empty()
            .extend(["devices", device.as_str(), "set-password"]);
        Ok(url)
    }
}

#[async_trait]
impl ProvisioningApi for HttpProvisioningApi {
    async fn set_password(
        &self,
        device: &DeviceIdentifier,
        password: &ValidatedPassword,
    ) -> Result<ProvisioningResponse, ApiError> {
        let url = self.endpoint(device)?;
        debug!(device_id = %device, %url, "Posting set-password request");

        let response = self
            .client
            .post(url)
            .json(&SetPasswordRequest {
                password: password.as_str(),
            })
            .send()
            .await?;

        // The body carries the verdict even on non-2xx replies
        let status = response.status();
        let body = response.text().await?;

        serde_json::from_str::<ProvisioningResponse>(&body).map_err(|source| {
            warn!(device_id = %device, status = status.as_u16(), "Unparsable provisioning response");
            ApiError::MalformedResponse {
                status: status.as_u16(),
                source,
            }
        })
    }
}
