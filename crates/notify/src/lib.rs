//! Departure notification delivery.
//!
//! This crate owns the outbound side of the dialog: once a caller confirms
//! at the terminal menu choice, the rights holder registered against the
//! quota code is notified over two independent channels.
//!
//! - **Transports** (`transport`, `sms`, `email`) - `send(recipient, message)`
//!   over an SMS gateway and an email relay; each channel fails alone
//! - **Dispatcher** (`dispatcher`) - ledger pre-check, recipient resolution,
//!   concurrent fan-out, ledger write
//!
//! # At-most-once
//!
//! The dispatcher never trusts its own memory: the dedup guarantee is the
//! ledger's uniqueness constraint. A conflict on the final write is the same
//! signal as a pre-check hit and both collapse into "already notified".

pub mod dispatcher;
pub mod email;
pub mod sms;
pub mod transport;

pub use dispatcher::NotificationDispatcher;
pub use email::EmailRelayClient;
pub use sms::SmsGatewayClient;
pub use transport::{ChannelKind, NotificationTransport, TransportError};
