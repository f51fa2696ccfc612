//! HTTP adapters for the meeting-provisioning and email-dispatch services.
//!
//! Both services accept JSON over POST with an optional bearer token.
//! A service with no base URL configured fails every call with
//! [`CollaboratorError::Unavailable`], which the workflow reports as a
//! degraded step.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use mentorhub_core::booking::{ParticipantRole, SessionDetails};
use mentorhub_core::errors::CollaboratorError;
use mentorhub_core::ids::{SessionId, UserId};
use mentorhub_core::ports::{EmailDispatcher, MeetingProvisioner};
use mentorhub_settings::IntegrationSettings;

use crate::error::ServerError;

/// Bearer token for the integration services. Never printed.
#[derive(Clone)]
pub struct ApiKey(pub SecretString);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// One JSON-over-HTTP service endpoint.
#[derive(Clone, Debug)]
pub struct ServiceClient {
    client: Client,
    base_url: Option<String>,
    api_key: Option<ApiKey>,
    timeout: Duration,
}

impl ServiceClient {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<ApiKey>,
        timeout: Duration,
    ) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServerError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.filter(|u| !u.trim().is_empty()),
            api_key,
            timeout,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    fn url(&self, path: &str) -> Result<String, CollaboratorError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| CollaboratorError::Unavailable("not configured".into()))?;
        Ok(format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/')))
    }

    /// POST `body` to `path`. Non-2xx responses become [`CollaboratorError`]s.
    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, CollaboratorError> {
        let url = self.url(path)?;
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.0.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CollaboratorError::Timeout(self.timeout)
            } else {
                CollaboratorError::Unavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(%url, status = status.as_u16(), "integration request rejected");
        Err(CollaboratorError::from_status(status.as_u16(), body))
    }
}

/// Build both clients from the integration settings.
pub fn clients_from_settings(
    settings: &IntegrationSettings,
) -> Result<(HttpMeetingProvisioner, HttpEmailDispatcher), ServerError> {
    let timeout = Duration::from_millis(settings.request_timeout_ms);
    let api_key = settings
        .api_key
        .clone()
        .map(|k| ApiKey(SecretString::from(k)));
    let meetings = ServiceClient::new(settings.meeting_api_url.clone(), api_key.clone(), timeout)?;
    let email = ServiceClient::new(settings.email_api_url.clone(), api_key, timeout)?;
    if !meetings.is_configured() {
        warn!("meeting API URL not configured, meeting links will not be generated");
    }
    if !email.is_configured() {
        warn!("email API URL not configured, confirmation emails will not be sent");
    }
    Ok((HttpMeetingProvisioner::new(meetings), HttpEmailDispatcher::new(email)))
}

#[derive(Serialize)]
struct CreateLinkRequest<'a> {
    session_id: &'a SessionId,
}

#[derive(Deserialize)]
struct CreateLinkResponse {
    meet_link: String,
}

/// `POST {base}/links` returning `{"meet_link": ...}`.
#[derive(Clone, Debug)]
pub struct HttpMeetingProvisioner {
    client: ServiceClient,
}

impl HttpMeetingProvisioner {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MeetingProvisioner for HttpMeetingProvisioner {
    async fn create_link(&self, session_id: &SessionId) -> Result<String, CollaboratorError> {
        let response = self
            .client
            .post("links", &CreateLinkRequest { session_id })
            .await?;
        let body: CreateLinkResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Rejected(format!("malformed response: {e}")))?;
        if body.meet_link.trim().is_empty() {
            return Err(CollaboratorError::Rejected("empty meet_link".into()));
        }
        debug!(%session_id, "meeting link generated");
        Ok(body.meet_link)
    }
}

#[derive(Serialize)]
struct ConfirmationRequest<'a> {
    role: ParticipantRole,
    session_id: &'a SessionId,
    recipient_id: &'a UserId,
    details: &'a SessionDetails,
}

/// `POST {base}/confirmations`. The response body is ignored.
#[derive(Clone, Debug)]
pub struct HttpEmailDispatcher {
    client: ServiceClient,
}

impl HttpEmailDispatcher {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmailDispatcher for HttpEmailDispatcher {
    async fn send(
        &self,
        role: ParticipantRole,
        session_id: &SessionId,
        recipient_id: &UserId,
        details: &SessionDetails,
    ) -> Result<(), CollaboratorError> {
        self.client
            .post(
                "confirmations",
                &ConfirmationRequest {
                    role,
                    session_id,
                    recipient_id,
                    details,
                },
            )
            .await?;
        Ok(())
    }
}
