use serde::{Deserialize, Serialize};

use crate::jwk::JWK;

/// A [DID document]
///
/// [DID document]: https://www.w3.org/TR/did-core/#dfn-did-documents
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// DID subject identifier.
    ///
    /// See: <https://www.w3.org/TR/did-core/#did-subject>
    pub id: String,

    /// Other URIs for the DID subject.
    ///
    /// See: <https://www.w3.org/TR/did-core/#also-known-as>
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub also_known_as: Vec<String>,

    /// Controllers(s).
    ///
    /// See: <https://www.w3.org/TR/did-core/#did-controller>
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controller: Vec<String>,

    /// [`verificationMethod`](https://www.w3.org/TR/did-core/#dfn-verificationmethod) property of a
    /// DID document, expressing [verification
    /// methods](https://www.w3.org/TR/did-core/#verification-methods).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_method: Vec<VerificationMethod>,

    /// Verification relationships.
    ///
    /// Each relationship lists, in order, the ids of the verification
    /// methods of this document it allows.
    ///
    /// See: <https://www.w3.org/TR/did-core/#verification-relationships>
    #[serde(flatten)]
    pub verification_relationships: VerificationRelationships,

    /// `service` property of a DID document, expressing
    /// [services](https://www.w3.org/TR/did-core/#services), generally as endpoints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,
}

impl Document {
    /// Construct a new DID document with the given id (DID).
    pub fn new(id: impl Into<String>) -> Document {
        Document {
            id: id.into(),
            also_known_as: Vec::new(),
            controller: Vec::new(),
            verification_method: Vec::new(),
            verification_relationships: VerificationRelationships::default(),
            service: Vec::new(),
        }
    }

    /// Construct a DID document from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Looks up a verification method by its absolute id.
    pub fn verification_method_by_id(&self, id: &str) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|vm| vm.id == id)
    }

    /// Verification methods allowed for the given relationship, in order.
    ///
    /// Dangling references are skipped.
    pub fn verification_methods_for(
        &self,
        relationship: VerificationRelationship,
    ) -> impl Iterator<Item = &VerificationMethod> {
        self.verification_relationships
            .get(relationship)
            .iter()
            .filter_map(|id| self.verification_method_by_id(id))
    }
}

/// Verification method type.
///
/// `did:dht` documents only carry JWK-expressed keys.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerificationMethodType {
    #[default]
    JsonWebKey,
}

/// A [verification method](https://www.w3.org/TR/did-core/#verification-methods).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Absolute verification method id (`<did>#<fragment>`).
    pub id: String,

    #[serde(rename = "type")]
    pub type_: VerificationMethodType,

    pub controller: String,

    pub public_key_jwk: JWK,
}

impl VerificationMethod {
    pub fn new(id: impl Into<String>, controller: impl Into<String>, public_key_jwk: JWK) -> Self {
        Self {
            id: id.into(),
            type_: VerificationMethodType::JsonWebKey,
            controller: controller.into(),
            public_key_jwk,
        }
    }

    /// Fragment of the id, after the last `#`.
    pub fn fragment(&self) -> Option<&str> {
        fragment(&self.id)
    }
}

/// A [service](https://www.w3.org/TR/did-core/#services).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,

    #[serde(rename = "type")]
    pub type_: String,

    pub service_endpoint: Vec<String>,
}

impl Service {
    /// Fragment of the id, after the last `#`.
    pub fn fragment(&self) -> Option<&str> {
        fragment(&self.id)
    }
}

pub(crate) fn fragment(id: &str) -> Option<&str> {
    id.rsplit_once('#').map(|(_, fragment)| fragment)
}

/// A [verification relationship](https://w3c.github.io/did-core/#dfn-verification-relationship).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum VerificationRelationship {
    Authentication,
    AssertionMethod,
    KeyAgreement,
    CapabilityInvocation,
    CapabilityDelegation,
}

impl VerificationRelationship {
    /// Every relationship, in the order used by the `did:dht` root record.
    pub const ALL: [Self; 5] = [
        Self::Authentication,
        Self::AssertionMethod,
        Self::KeyAgreement,
        Self::CapabilityInvocation,
        Self::CapabilityDelegation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::AssertionMethod => "assertionMethod",
            Self::KeyAgreement => "keyAgreement",
            Self::CapabilityInvocation => "capabilityInvocation",
            Self::CapabilityDelegation => "capabilityDelegation",
        }
    }
}

/// The five verification relationships of a document, as ordered lists of
/// verification method ids.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRelationships {
    /// [`authentication`](https://www.w3.org/TR/did-core/#dfn-authentication) property of a DID
    /// document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<String>,

    /// [`assertionMethod`](https://www.w3.org/TR/did-core/#dfn-assertionmethod) property of a DID
    /// document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertion_method: Vec<String>,

    /// [`keyAgreement`](https://www.w3.org/TR/did-core/#dfn-keyagreement) property of a DID
    /// document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_agreement: Vec<String>,

    /// [`capabilityInvocation`](https://www.w3.org/TR/did-core/#dfn-capabilityinvocation) property
    /// of a DID document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capability_invocation: Vec<String>,

    /// [`capabilityDelegation`](https://www.w3.org/TR/did-core/#dfn-capabilitydelegation) property
    /// of a DID document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capability_delegation: Vec<String>,
}

impl VerificationRelationships {
    pub fn get(&self, relationship: VerificationRelationship) -> &[String] {
        match relationship {
            VerificationRelationship::Authentication => &self.authentication,
            VerificationRelationship::AssertionMethod => &self.assertion_method,
            VerificationRelationship::KeyAgreement => &self.key_agreement,
            VerificationRelationship::CapabilityInvocation => &self.capability_invocation,
            VerificationRelationship::CapabilityDelegation => &self.capability_delegation,
        }
    }

    pub fn get_mut(&mut self, relationship: VerificationRelationship) -> &mut Vec<String> {
        match relationship {
            VerificationRelationship::Authentication => &mut self.authentication,
            VerificationRelationship::AssertionMethod => &mut self.assertion_method,
            VerificationRelationship::KeyAgreement => &mut self.key_agreement,
            VerificationRelationship::CapabilityInvocation => &mut self.capability_invocation,
            VerificationRelationship::CapabilityDelegation => &mut self.capability_delegation,
        }
    }

    pub fn is_empty(&self) -> bool {
        VerificationRelationship::ALL
            .iter()
            .all(|r| self.get(*r).is_empty())
    }
}
