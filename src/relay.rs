//! [Pkarr](https://github.com/Nuhvi/pkarr) relay client.
//!
//! A relay answers `GET /<z-base-32 key>` with the latest BEP44 mutable item
//! stored in the DHT under that key, serialized as
//! `signature (64 bytes) || seq (8 bytes, big endian) || value`.
use async_trait::async_trait;
use ed25519_dalek::{Signature, Verifier, SIGNATURE_LENGTH};

use crate::{
    gateway::{Context, Gateway, GatewayError},
    packet::MAX_PACKET_SIZE,
    Identifier,
};

pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Public relay used by [`RelayGateway::default`].
pub const DEFAULT_RELAY_URL: &str = "https://diddht.tbddev.org";

const SEQ_LENGTH: usize = 8;

/// Largest relay response body holding a valid packet.
pub const MAX_BODY_SIZE: usize = SIGNATURE_LENGTH + SEQ_LENGTH + MAX_PACKET_SIZE;

/// A BEP44 mutable item whose signature has been checked against its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPacket {
    pub signature: Signature,
    pub seq: u64,
    pub value: Vec<u8>,
}

impl SignedPacket {
    /// Parses a relay response body and verifies it was signed by
    /// `identifier`.
    pub fn verify(identifier: &Identifier, body: &[u8]) -> Result<Self, GatewayError> {
        if body.len() < SIGNATURE_LENGTH + SEQ_LENGTH {
            return Err(GatewayError::Malformed(format!(
                "expected at least {} bytes, found {}",
                SIGNATURE_LENGTH + SEQ_LENGTH,
                body.len()
            )));
        }

        let (signature, rest) = body.split_at(SIGNATURE_LENGTH);
        let (seq, value) = rest.split_at(SEQ_LENGTH);
        if value.len() > MAX_PACKET_SIZE {
            return Err(GatewayError::Malformed(format!(
                "value is {} bytes, more than {MAX_PACKET_SIZE}",
                value.len()
            )));
        }

        let signature = Signature::from_slice(signature)?;
        let mut seq_bytes = [0u8; SEQ_LENGTH];
        seq_bytes.copy_from_slice(seq);
        let seq = u64::from_be_bytes(seq_bytes);

        identifier
            .verifying_key()?
            .verify(&signable(seq, value), &signature)?;

        Ok(Self {
            signature,
            seq,
            value: value.to_vec(),
        })
    }

    /// Relay representation of the packet.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(SIGNATURE_LENGTH + SEQ_LENGTH + self.value.len());
        bytes.extend_from_slice(&self.signature.to_bytes());
        bytes.extend_from_slice(&self.seq.to_be_bytes());
        bytes.extend_from_slice(&self.value);
        bytes
    }
}

/// BEP44 signable form of a mutable item without salt:
/// the bencoded `seq` and `v` entries.
pub fn signable(seq: u64, value: &[u8]) -> Vec<u8> {
    let mut signable = format!("3:seqi{seq}e1:v{}:", value.len()).into_bytes();
    signable.extend_from_slice(value);
    signable
}

/// [`Gateway`] querying a Pkarr relay over HTTP.
#[derive(Debug, Clone)]
pub struct RelayGateway {
    url: String,
    client: reqwest::Client,
}

impl RelayGateway {
    /// Creates a gateway for the relay at `url`, using the given HTTP client.
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        let url: String = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Builds the default HTTP client, identifying this crate as user agent.
    pub fn default_client() -> Result<reqwest::Client, reqwest::Error> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "User-Agent",
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );
        reqwest::Client::builder().default_headers(headers).build()
    }

    /// Fetches and verifies the latest signed packet stored under the
    /// identifier.
    pub async fn fetch_signed_packet(
        &self,
        ctx: &Context,
        identifier: &Identifier,
    ) -> Result<SignedPacket, GatewayError> {
        let url = format!("{}/{}", self.url, identifier);
        log::debug!("fetching {url}");

        let mut request = self.client.get(&url);
        if let Some(timeout) = ctx.deadline() {
            request = request.timeout(timeout);
        }

        let mut resp = request.send().await.map_err(map_reqwest_error)?;
        if let Err(err) = resp.error_for_status_ref() {
            if err.status() == Some(reqwest::StatusCode::NOT_FOUND) {
                return Err(GatewayError::NotFound);
            }
            return Err(GatewayError::Status(resp.status()));
        }

        if let Some(len) = resp.content_length() {
            if len > MAX_BODY_SIZE as u64 {
                return Err(body_too_large(len));
            }
        }
        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(map_reqwest_error)? {
            if body.len() + chunk.len() > MAX_BODY_SIZE {
                return Err(body_too_large((body.len() + chunk.len()) as u64));
            }
            body.extend_from_slice(&chunk);
        }
        let packet = SignedPacket::verify(identifier, &body)?;
        log::debug!("got packet seq={} ({} bytes)", packet.seq, packet.value.len());
        Ok(packet)
    }
}

fn body_too_large(len: u64) -> GatewayError {
    GatewayError::Malformed(format!(
        "response body is at least {len} bytes, more than {MAX_BODY_SIZE}"
    ))
}

impl Default for RelayGateway {
    /// Gateway to the public relay.
    ///
    /// Falls back to a client without the user agent header if the default
    /// client cannot be built.
    fn default() -> Self {
        let client = Self::default_client().unwrap_or_else(|err| {
            log::warn!("Error building HTTP client: {err}");
            reqwest::Client::new()
        });
        Self::new(DEFAULT_RELAY_URL, client)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Http(err)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Gateway for RelayGateway {
    async fn fetch_value(
        &self,
        ctx: &Context,
        identifier: &Identifier,
    ) -> Result<Vec<u8>, GatewayError> {
        Ok(self.fetch_signed_packet(ctx, identifier).await?.value)
    }
}
