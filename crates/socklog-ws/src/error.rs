use thiserror::Error;

/// Synchronous failure to construct a transport
///
/// Anything that can only fail after the handshake starts is reported as a
/// [`TransportEvent::Error`](crate::TransportEvent::Error) instead.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid WebSocket URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported URL scheme '{scheme}' (expected ws or wss)")]
    UnsupportedScheme { scheme: String },

    #[error("no async runtime available to drive the connection")]
    NoRuntime,
}

impl ConnectError {
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
