//! `did:dht` method specific identifiers.
//!
//! The identifier is the z-base-32 encoding of an Ed25519 public key. The same
//! key is the BEP44 mutable item key under which the DID document is stored
//! in the DHT, and the path component used to query a Pkarr relay.
use core::fmt;
use std::str::FromStr;

use base32::Alphabet;

/// Length in bytes of a decoded identifier (an Ed25519 public key).
pub const IDENTIFIER_LENGTH: usize = 32;

/// Error raised when a method specific identifier cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidIdentifier {
    #[error("`{0}` is not z-base-32 text")]
    Encoding(String),

    #[error("identifier decodes to no bytes")]
    Empty,

    #[error("invalid identifier length: expected {IDENTIFIER_LENGTH} bytes, found {0}")]
    Length(usize),
}

/// Raw `did:dht` identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identifier([u8; IDENTIFIER_LENGTH]);

impl Identifier {
    pub const fn new(bytes: [u8; IDENTIFIER_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Decodes a z-base-32 method specific identifier.
    pub fn decode(method_specific_id: &str) -> Result<Self, InvalidIdentifier> {
        let bytes = base32::decode(Alphabet::Z, method_specific_id)
            .ok_or_else(|| InvalidIdentifier::Encoding(method_specific_id.to_string()))?;

        if bytes.is_empty() {
            return Err(InvalidIdentifier::Empty);
        }

        bytes
            .as_slice()
            .try_into()
            .map(Self)
            .map_err(|_| InvalidIdentifier::Length(bytes.len()))
    }

    pub fn as_bytes(&self) -> &[u8; IDENTIFIER_LENGTH] {
        &self.0
    }

    /// z-base-32 form of the identifier, as it appears in the DID.
    pub fn encode(&self) -> String {
        base32::encode(Alphabet::Z, &self.0)
    }

    /// The `did:dht` DID for this identifier.
    pub fn did(&self) -> String {
        format!("did:{}:{}", crate::DID_METHOD_NAME, self.encode())
    }

    /// Interprets the identifier as the Ed25519 key signing the DHT record.
    pub fn verifying_key(
        &self,
    ) -> Result<ed25519_dalek::VerifyingKey, ed25519_dalek::SignatureError> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.0)
    }
}

impl From<ed25519_dalek::VerifyingKey> for Identifier {
    fn from(key: ed25519_dalek::VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl FromStr for Identifier {
    type Err = InvalidIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({self})")
    }
}
