use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use harborcall_core::config::EmailConfig;

use crate::transport::{ChannelKind, NotificationTransport, TransportError};

pub const DEPARTURE_SUBJECT: &str = "Skipper (Auth Rep) Departure Notification";

#[derive(Debug, Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Email relay client: JSON POST with bearer authentication. The relay
/// accepting the message is delivery confirmation for this channel.
pub struct EmailRelayClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    from_address: String,
}

impl EmailRelayClient {
    pub fn from_config(config: &EmailConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|error| TransportError::Build(error.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl NotificationTransport for EmailRelayClient {
    fn channel(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn send(&self, recipient: &str, message: &str) -> Result<(), TransportError> {
        let payload = RelayPayload {
            from: &self.from_address,
            to: recipient,
            subject: DEPARTURE_SUBJECT,
            text: message,
        };

        let response = self
            .http
            .post(&self.base_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|error| TransportError::Request(error.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Rejected(format!("email relay answered {status}")))
        }
    }
}
