//! Record gateway: the boundary between the resolver and the DHT.
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{AbortHandle, AbortRegistration};

use crate::Identifier;

/// Error raised by a [`Gateway`].
///
/// The resolver reports every gateway failure as `notFound`; the variants
/// only serve diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No record is stored under the identifier.
    #[error("record not found")]
    NotFound,

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,

    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected relay response status {0}")]
    Status(reqwest::StatusCode),

    /// The relay response is not a signed packet.
    #[error("malformed signed packet: {0}")]
    Malformed(String),

    /// The packet signature does not match the identifier.
    #[error("invalid signature: {0}")]
    Signature(#[from] ed25519_dalek::SignatureError),
}

/// Caller supplied cancellation and timeout for one resolution.
///
/// Only the gateway fetch is affected: every other resolution step is
/// CPU-only and runs to completion.
#[derive(Debug, Default)]
pub struct Context {
    timeout: Option<Duration>,
    abort: Option<AbortRegistration>,
}

impl Context {
    /// A context that never cancels and sets no timeout of its own.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context whose fetch must complete within `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            abort: None,
        }
    }

    /// A context cancelled by calling [`AbortHandle::abort`] on the returned
    /// handle.
    pub fn cancellable() -> (Self, AbortHandle) {
        let (handle, registration) = AbortHandle::new_pair();
        (
            Self {
                timeout: None,
                abort: Some(registration),
            },
            handle,
        )
    }

    /// Adds a timeout to this context.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn take_abort(&mut self) -> Option<AbortRegistration> {
        self.abort.take()
    }
}

/// Source of signed `did:dht` records.
///
/// Implementations are responsible for reaching the DHT (directly or through
/// a relay) and for checking the authenticity and freshness of what they
/// return. The returned bytes are the record value: an encoded DID document.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Gateway: Send + Sync {
    async fn fetch_value(
        &self,
        ctx: &Context,
        identifier: &Identifier,
    ) -> Result<Vec<u8>, GatewayError>;
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl<G: Gateway + ?Sized> Gateway for std::sync::Arc<G> {
    async fn fetch_value(
        &self,
        ctx: &Context,
        identifier: &Identifier,
    ) -> Result<Vec<u8>, GatewayError> {
        G::fetch_value(self, ctx, identifier).await
    }
}
