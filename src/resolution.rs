//! Resolution errors and results.
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    did::InvalidDID, gateway::GatewayError, identifier::InvalidIdentifier, packet::DecodeError,
    Document,
};

/// Public resolution error code.
///
/// This is the whole vocabulary a resolution may report: detailed causes are
/// only available through [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    /// Malformed DID, or malformed DID document record.
    InvalidDid,

    /// The DID method is not `dht`.
    MethodNotSupported,

    /// The method specific identifier is not an encoded Ed25519 public key.
    InvalidPublicKey,

    /// No authenticated record could be fetched for the identifier.
    NotFound,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidDid => "invalidDid",
            Self::MethodNotSupported => "methodNotSupported",
            Self::InvalidPublicKey => "invalidPublicKey",
            Self::NotFound => "notFound",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DID resolution error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    InvalidDid(#[from] InvalidDID),

    /// DID method is not supported by this resolver.
    #[error("DID method `{0}` not supported")]
    MethodNotSupported(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(#[from] InvalidIdentifier),

    /// The gateway could not provide the DID document record.
    #[error("DID document not found: {0}")]
    NotFound(#[from] GatewayError),

    /// The fetched record is not a valid DID document packet.
    #[error("invalid DID document: {0}")]
    InvalidDocument(#[from] DecodeError),
}

impl Error {
    /// Returns the public error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidDid(_) | Self::InvalidDocument(_) => ErrorCode::InvalidDid,
            Self::MethodNotSupported(_) => ErrorCode::MethodNotSupported,
            Self::InvalidPublicKey(_) => ErrorCode::InvalidPublicKey,
            Self::NotFound(_) => ErrorCode::NotFound,
        }
    }
}

/// Outcome of a resolution: either a DID document or an error code.
///
/// Serializes as a [DID resolution result](https://w3c-ccg.github.io/did-resolution/#did-resolution-result).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ResultRepr", try_from = "ResultRepr")]
pub struct ResolutionResult {
    document: Option<Document>,
    error: Option<ErrorCode>,
}

impl ResolutionResult {
    pub fn from_document(document: Document) -> Self {
        Self {
            document: Some(document),
            error: None,
        }
    }

    pub fn from_error(code: ErrorCode) -> Self {
        Self {
            document: None,
            error: Some(code),
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn error(&self) -> Option<ErrorCode> {
        self.error
    }

    pub fn into_document(self) -> Option<Document> {
        self.document
    }
}

impl From<Result<Document, Error>> for ResolutionResult {
    fn from(result: Result<Document, Error>) -> Self {
        match result {
            Ok(document) => Self::from_document(document),
            Err(err) => Self::from_error(err.code()),
        }
    }
}

/// <https://w3c.github.io/did-core/#did-resolution-metadata>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ResolutionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<ErrorCode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    did_document: Option<Document>,

    #[serde(default)]
    did_resolution_metadata: ResolutionMetadata,
}

impl From<ResolutionResult> for ResultRepr {
    fn from(result: ResolutionResult) -> Self {
        Self {
            did_document: result.document,
            did_resolution_metadata: ResolutionMetadata {
                error: result.error,
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("a resolution result must carry either a document or an error")]
pub struct InvalidResolutionResult;

impl TryFrom<ResultRepr> for ResolutionResult {
    type Error = InvalidResolutionResult;

    fn try_from(repr: ResultRepr) -> Result<Self, Self::Error> {
        match (repr.did_document, repr.did_resolution_metadata.error) {
            (Some(document), None) => Ok(Self::from_document(document)),
            (None, Some(code)) => Ok(Self::from_error(code)),
            _ => Err(InvalidResolutionResult),
        }
    }
}
