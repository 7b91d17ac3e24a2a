//! `did:dht` DID method resolver.
//!
//! A `did:dht` DID is the z-base-32 encoding of an Ed25519 public key. The
//! DID document is stored in the Mainline DHT as a BEP44 mutable item signed
//! by that key, its value being a small DNS message of `TXT` records. This
//! crate implements the read path: the DID is parsed and its identifier
//! decoded, the signed record is fetched through a [`Gateway`] (by default
//! a Pkarr relay, see [`relay`]) and the record is decoded into a
//! [`Document`].
//!
//! ```no_run
//! # async fn example() {
//! use did_dht::DIDDHT;
//!
//! let resolver = DIDDHT::default();
//! let result = resolver
//!     .resolve("did:dht:cwxob5rbhhu3z9x3gfqy6cthqgm6ngrh4k8s615n7pw11czoq4fy")
//!     .await;
//! match result.document() {
//!     Some(document) => println!("{}", serde_json::to_string_pretty(document).unwrap()),
//!     None => eprintln!("resolution failed: {:?}", result.error()),
//! }
//! # }
//! ```
use std::time::Duration;

use futures::future::{Abortable, Aborted};

pub mod config;
pub mod did;
pub mod dns;
pub mod document;
pub mod gateway;
pub mod identifier;
pub mod jwk;
pub mod packet;
pub mod relay;
pub mod resolution;

pub use config::Config;
pub use did::{InvalidDID, DID};
pub use document::{Document, Service, VerificationMethod, VerificationRelationship};
pub use gateway::{Context, Gateway, GatewayError};
pub use identifier::{Identifier, InvalidIdentifier};
pub use jwk::JWK;
pub use relay::RelayGateway;
pub use resolution::{Error, ErrorCode, ResolutionResult};

/// Method name of `did:dht` DIDs.
pub const DID_METHOD_NAME: &str = "dht";

/// did:dht Method
///
/// [Specification](https://did-dht.com/)
///
/// The resolver holds no per-resolution state and can be shared between
/// tasks, for instance behind an [`Arc`](std::sync::Arc).
#[derive(Debug, Clone)]
pub struct DIDDHT<G = RelayGateway> {
    gateway: G,
    timeout: Option<Duration>,
}

impl DIDDHT<RelayGateway> {
    /// Creates a resolver querying the relay of the given configuration
    /// with the given HTTP client.
    pub fn new(config: Config, client: reqwest::Client) -> Self {
        Self {
            gateway: RelayGateway::new(config.relay_url, client),
            timeout: config.timeout,
        }
    }
}

impl Default for DIDDHT<RelayGateway> {
    /// Resolver using the public relay.
    fn default() -> Self {
        Self {
            gateway: RelayGateway::default(),
            timeout: Config::default().timeout,
        }
    }
}

impl<G: Gateway> DIDDHT<G> {
    /// Creates a resolver fetching records through the given gateway.
    pub fn with_gateway(gateway: G) -> Self {
        Self {
            gateway,
            timeout: None,
        }
    }

    /// Sets the timeout applied when the resolution context has none.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Resolves a DID.
    pub async fn resolve(&self, uri: &str) -> ResolutionResult {
        self.resolve_with_context(Context::background(), uri).await
    }

    /// Resolves a DID, the record fetch being subject to the cancellation
    /// and timeout of `ctx`.
    pub async fn resolve_with_context(&self, ctx: Context, uri: &str) -> ResolutionResult {
        let result = self.try_resolve_with_context(ctx, uri).await;
        if let Err(err) = &result {
            log::warn!("cannot resolve `{uri}` ({}): {err}", err.code());
        }
        result.into()
    }

    /// Resolves a DID, returning the detailed error on failure.
    pub async fn try_resolve(&self, uri: &str) -> Result<Document, Error> {
        self.try_resolve_with_context(Context::background(), uri)
            .await
    }

    /// Resolves a DID with the given context, returning the detailed error
    /// on failure.
    pub async fn try_resolve_with_context(
        &self,
        ctx: Context,
        uri: &str,
    ) -> Result<Document, Error> {
        let did = DID::parse(uri)?;
        log::debug!("parsed `{}`", did.uri());

        if did.method_name() != DID_METHOD_NAME {
            return Err(Error::MethodNotSupported(did.method_name().to_string()));
        }

        let identifier = Identifier::decode(did.method_specific_id())?;
        log::debug!("decoded identifier of `{}`", did.uri());

        let value = self.fetch(ctx, &identifier).await?;
        log::debug!("fetched {} bytes for `{}`", value.len(), did.uri());

        let document = packet::from_bytes(&value, &did.did())?;
        log::debug!(
            "decoded document of `{}` ({} verification methods)",
            document.id,
            document.verification_method.len()
        );
        Ok(document)
    }

    async fn fetch(
        &self,
        mut ctx: Context,
        identifier: &Identifier,
    ) -> Result<Vec<u8>, GatewayError> {
        if ctx.deadline().is_none() {
            if let Some(timeout) = self.timeout {
                ctx = ctx.timeout(timeout);
            }
        }

        match ctx.take_abort() {
            Some(registration) => {
                let fetch = self.gateway.fetch_value(&ctx, identifier);
                match Abortable::new(fetch, registration).await {
                    Ok(result) => result,
                    Err(Aborted) => {
                        log::debug!("fetch of `{identifier}` cancelled");
                        Err(GatewayError::Cancelled)
                    }
                }
            }
            None => self.gateway.fetch_value(&ctx, identifier).await,
        }
    }
}
