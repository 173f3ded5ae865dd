use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport client could not be built: {0}")]
    Build(String),
    #[error("transport request failed: {0}")]
    Request(String),
    #[error("transport rejected the message: {0}")]
    Rejected(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    Sms,
    Email,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Email => "email",
        }
    }
}

/// One delivery channel. Implementations confirm acceptance by their
/// transport; retry/backoff policy is the transport's own concern and out of
/// scope here.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    fn channel(&self) -> ChannelKind;

    async fn send(&self, recipient: &str, message: &str) -> Result<(), TransportError>;
}

/// Accepts everything without talking to anyone. Used for wiring tests and
/// deployments where a channel is not yet credentialed.
pub struct NoopTransport {
    channel: ChannelKind,
}

impl NoopTransport {
    pub fn new(channel: ChannelKind) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl NotificationTransport for NoopTransport {
    fn channel(&self) -> ChannelKind {
        self.channel
    }

    async fn send(&self, _recipient: &str, _message: &str) -> Result<(), TransportError> {
        Ok(())
    }
}
