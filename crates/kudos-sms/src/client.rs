// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Messages resource.

use std::time::Duration;

use async_trait::async_trait;
use kudos_config::model::MessagingConfig;
use kudos_core::types::{DeliveryConfirmation, HealthStatus, OutboundSms, Retryability};
use kudos_core::{KudosError, MessagingGateway, PluginAdapter, SendError};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::classify::classify_twilio_error;
use crate::types::{ApiErrorResponse, MessageResource};

/// Which sender identity to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sender {
    /// Pooled sender (`MessagingServiceSid`).
    MessagingService(String),
    /// Single phone number (`From`).
    From(String),
}

/// Twilio-compatible SMS client. One HTTP request per [`MessagingGateway::send`].
#[derive(Debug, Clone)]
pub struct TwilioClient {
    client: reqwest::Client,
    account_sid: String,
    auth_token: SecretString,
    sender: Sender,
    base_url: String,
}

impl TwilioClient {
    pub fn new(
        account_sid: String,
        auth_token: SecretString,
        sender: Sender,
        timeout: Duration,
    ) -> Result<Self, KudosError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KudosError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            account_sid,
            auth_token,
            sender,
            base_url: "https://api.twilio.com".to_string(),
        })
    }

    /// Build a client from `[messaging]`. Fails when credentials or a sender are missing.
    pub fn from_config(config: &MessagingConfig) -> Result<Self, KudosError> {
        let account_sid = config
            .account_sid
            .clone()
            .ok_or_else(|| KudosError::Config("messaging.account_sid is not set".into()))?;
        let auth_token = config
            .auth_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| KudosError::Config("messaging.auth_token is not set".into()))?;
        let sender = match (&config.messaging_service_sid, &config.from_number) {
            (Some(sid), _) => Sender::MessagingService(sid.clone()),
            (None, Some(from)) => Sender::From(from.clone()),
            (None, None) => {
                return Err(KudosError::Config(
                    "messaging needs either from_number or messaging_service_sid".into(),
                ));
            }
        };

        Ok(Self::new(
            account_sid,
            SecretString::from(auth_token),
            sender,
            Duration::from_secs(config.timeout_secs),
        )?
        .with_base_url(config.api_base_url.clone()))
    }

    /// Overrides the API base URL (regional edges, wiremock).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }

    fn form<'a>(&'a self, message: &'a OutboundSms) -> [(&'static str, &'a str); 3] {
        let sender = match &self.sender {
            Sender::MessagingService(sid) => ("MessagingServiceSid", sid.as_str()),
            Sender::From(number) => ("From", number.as_str()),
        };
        [
            ("To", message.to.as_str()),
            ("Body", message.body.as_str()),
            sender,
        ]
    }
}

#[async_trait]
impl PluginAdapter for TwilioClient {
    fn name(&self) -> &str {
        "twilio"
    }

    async fn health_check(&self) -> Result<HealthStatus, KudosError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}.json",
            self.base_url, self.account_sid
        );
        let status = match self
            .client
            .get(&url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .send()
            .await
        {
            Ok(response) => response.status(),
            Err(e) => return Ok(HealthStatus::Unhealthy(format!("unreachable: {e}"))),
        };
        if status.is_success() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded(format!("account lookup returned {status}")))
        }
    }
}

#[async_trait]
impl MessagingGateway for TwilioClient {
    async fn send(&self, message: &OutboundSms) -> Result<DeliveryConfirmation, SendError> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&self.form(message))
            .send()
            .await
            .map_err(|e| SendError::transport(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            // Once the provider has accepted the message a resend would duplicate it.
            if status.is_success() {
                warn!(status = %status, error = %e, "accepted response body unreadable");
                SendError::provider(
                    format!("failed to read accepted response: {e}"),
                    status.as_u16(),
                    None,
                )
            } else {
                SendError::transport(format!("failed to read response: {e}"))
            }
        })?;

        if status.is_success() {
            let resource: MessageResource = serde_json::from_str(&body).map_err(|e| {
                SendError::provider(
                    format!("unparseable success response: {e}"),
                    status.as_u16(),
                    None,
                )
            })?;
            debug!(sid = %resource.sid, status = %resource.status, "message accepted");
            return Ok(DeliveryConfirmation {
                provider_message_id: resource.sid,
                provider_status: resource.status,
                tracking_link: None,
            });
        }

        let api_error = serde_json::from_str::<ApiErrorResponse>(&body).ok();
        let code = api_error.as_ref().and_then(|e| e.code);
        let detail = api_error
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("provider returned {status}"));
        warn!(status = %status, code = ?code, "message rejected by provider");
        Err(SendError::provider(detail, status.as_u16(), code))
    }

    fn classify(&self, error: &SendError) -> Retryability {
        classify_twilio_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MESSAGES_PATH: &str = "/2010-04-01/Accounts/AC123/Messages.json";

    fn test_client(base_url: &str, sender: Sender) -> TwilioClient {
        TwilioClient::new(
            "AC123".into(),
            SecretString::from("tw-secret-token".to_string()),
            sender,
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(base_url.to_string())
    }

    fn sms() -> OutboundSms {
        OutboundSms {
            to: "+15551234567".into(),
            body: "Thanks Ana! https://kudo.link/r/abc".into(),
        }
    }

    #[tokio::test]
    async fn send_posts_form_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .and(header_exists("authorization"))
            .and(body_string_contains("To=%2B15551234567"))
            .and(body_string_contains("MessagingServiceSid=MG42"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "sid": "SM0001",
                "status": "queued"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Sender::MessagingService("MG42".into()));
        let confirmation = client.send(&sms()).await.unwrap();
        assert_eq!(confirmation.provider_message_id, "SM0001");
        assert_eq!(confirmation.provider_status, "queued");
    }

    #[tokio::test]
    async fn from_number_used_without_messaging_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .and(body_string_contains("From=%2B15550001111"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "sid": "SM0002",
                "status": "accepted"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Sender::From("+15550001111".into()));
        assert_eq!(client.send(&sms()).await.unwrap().provider_message_id, "SM0002");
    }

    #[tokio::test]
    async fn invalid_number_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "code": 21211,
                "message": "The 'To' number +1555 is not a valid phone number.",
                "status": 400
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Sender::From("+15550001111".into()));
        let err = client.send(&sms()).await.unwrap_err();
        assert_eq!(err.provider_code, Some(21211));
        assert_eq!(err.http_status, Some(400));
        assert_eq!(client.classify(&err), Retryability::Permanent);
    }

    #[tokio::test]
    async fn server_error_without_body_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Sender::From("+15550001111".into()));
        let err = client.send(&sms()).await.unwrap_err();
        assert_eq!(err.provider_code, None);
        assert_eq!(client.classify(&err), Retryability::Retryable);
    }

    /// Serves one response that promises more body bytes than it sends.
    async fn truncated_response_server(status_line: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_ascii_lowercase();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if n == 0 || request.len() >= end + 4 + length {
                        break;
                    }
                } else if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: 500\r\nconnection: close\r\n\r\n{{\"sid\": \"SM"
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn unreadable_accepted_response_is_not_retried() {
        let base = truncated_response_server("201 Created").await;
        let client = test_client(&base, Sender::From("+15550001111".into()));
        let err = client.send(&sms()).await.unwrap_err();
        assert!(!err.transport);
        assert_eq!(err.http_status, Some(201));
        assert_eq!(client.classify(&err), Retryability::Permanent);
    }

    #[tokio::test]
    async fn unreadable_error_response_stays_retryable() {
        let base = truncated_response_server("503 Service Unavailable").await;
        let client = test_client(&base, Sender::From("+15550001111".into()));
        let err = client.send(&sms()).await.unwrap_err();
        assert!(err.transport);
        assert_eq!(client.classify(&err), Retryability::Retryable);
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        let client = test_client("http://127.0.0.1:1", Sender::From("+15550001111".into()));
        let err = client.send(&sms()).await.unwrap_err();
        assert!(err.transport);
        assert_eq!(client.classify(&err), Retryability::Retryable);
    }

    #[test]
    fn from_config_requires_sender() {
        let config = MessagingConfig {
            account_sid: Some("AC1".into()),
            auth_token: Some("t".into()),
            ..MessagingConfig::default()
        };
        assert!(matches!(
            TwilioClient::from_config(&config),
            Err(KudosError::Config(_))
        ));
    }

    #[test]
    fn debug_output_hides_auth_token() {
        let client = test_client("http://localhost", Sender::From("+1".into()));
        assert!(!format!("{client:?}").contains("tw-secret-token"));
    }
}
