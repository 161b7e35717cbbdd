// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Square Customers API lookups for payment enrichment.

use std::time::Duration;

use async_trait::async_trait;
use kudos_config::model::SquareConfig;
use kudos_core::types::{CustomerContact, IntegrationCredential};
use kudos_core::{CustomerDirectory, KudosError};
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::debug;

use crate::sources::fields::join_name;

#[derive(Debug, Deserialize)]
struct CustomerResponse {
    customer: Option<Customer>,
}

#[derive(Debug, Deserialize)]
struct Customer {
    given_name: Option<String>,
    family_name: Option<String>,
    phone_number: Option<String>,
}

/// Fetches customers with the integration's access token (its `api_key`).
#[derive(Debug, Clone)]
pub struct SquareCustomerDirectory {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl SquareCustomerDirectory {
    pub fn new(config: &SquareConfig) -> Result<Self, KudosError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| KudosError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[async_trait]
impl CustomerDirectory for SquareCustomerDirectory {
    async fn lookup(
        &self,
        credential: &IntegrationCredential,
        customer_ref: &str,
    ) -> Result<Option<CustomerContact>, KudosError> {
        let token = credential.api_key.as_ref().ok_or_else(|| {
            KudosError::Config(format!(
                "integration {} has no Square access token",
                credential.integration_id
            ))
        })?;

        let url = format!("{}/v2/customers/{customer_ref}", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose_secret())
            .header("Square-Version", &self.api_version)
            .send()
            .await
            .map_err(|e| KudosError::Internal(format!("customer lookup failed: {e}")))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => {
                return Err(KudosError::Internal(format!(
                    "customer lookup returned {status}"
                )));
            }
            _ => {}
        }

        let body: CustomerResponse = response
            .json()
            .await
            .map_err(|e| KudosError::Internal(format!("unparseable customer response: {e}")))?;
        debug!(
            integration_id = %credential.integration_id,
            found = body.customer.is_some(),
            "customer lookup complete"
        );

        Ok(body.customer.map(|c| CustomerContact {
            phone: non_blank(c.phone_number),
            name: join_name(non_blank(c.given_name), non_blank(c.family_name)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use kudos_core::types::SourceProvider;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::sources::test_support::credential;

    fn directory(base: &str) -> SquareCustomerDirectory {
        SquareCustomerDirectory::new(&SquareConfig {
            api_base_url: base.to_string(),
            ..SquareConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn returns_phone_and_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/customers/CUST1"))
            .and(header("authorization", "Bearer key-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "customer": {
                    "id": "CUST1",
                    "given_name": "Ana",
                    "family_name": "Lima",
                    "phone_number": "+15551234567"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let contact = directory(&server.uri())
            .lookup(&credential(SourceProvider::PosSquare), "CUST1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(contact.phone.as_deref(), Some("+15551234567"));
        assert_eq!(contact.name.as_deref(), Some("Ana Lima"));
    }

    #[tokio::test]
    async fn unknown_customer_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let found = directory(&server.uri())
            .lookup(&credential(SourceProvider::PosSquare), "NOPE")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn server_errors_surface() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = directory(&server.uri())
            .lookup(&credential(SourceProvider::PosSquare), "CUST1")
            .await;
        assert!(result.is_err());
    }
}
