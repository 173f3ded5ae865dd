use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use harborcall_core::config::SmsConfig;

use crate::transport::{ChannelKind, NotificationTransport, TransportError};

/// SMS gateway client. The gateway exposes a form-encoded messaging endpoint
/// authenticated with an API key header; a 2xx response means the message
/// was accepted for delivery.
pub struct SmsGatewayClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    api_key: SecretString,
    sender_id: String,
}

impl SmsGatewayClient {
    pub fn from_config(config: &SmsConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|error| TransportError::Build(error.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            username: config.username.clone(),
            api_key: config.api_key.clone(),
            sender_id: config.sender_id.clone(),
        })
    }
}

#[async_trait]
impl NotificationTransport for SmsGatewayClient {
    fn channel(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn send(&self, recipient: &str, message: &str) -> Result<(), TransportError> {
        let response = self
            .http
            .post(&self.base_url)
            .header("apiKey", self.api_key.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("username", self.username.as_str()),
                ("to", recipient),
                ("message", message),
                ("from", self.sender_id.as_str()),
            ])
            .send()
            .await
            .map_err(|error| TransportError::Request(error.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Rejected(format!("sms gateway answered {status}")))
        }
    }
}
