//! `did:dht` document encoding.
//!
//! A document is mapped to a small set of DNS `TXT` records:
//!
//! ```text
//! _did.       v=0;vm=k0,k1;auth=k0;asm=k0,k1;agm=k1;inv=k0;del=k0;svc=s0
//! _k0._did.   id=0;t=0;k=<base64url public key>
//! _k1._did.   id=enc;t=3;k=<base64url public key>
//! _s0._did.   id=dwn;t=DecentralizedWebNode;se=https://example.com/dwn
//! _aka._did.  aka=did:example:alias
//! _cnt._did.  cnt=did:example:controller
//! ```
//!
//! The root record (`_did.`) lists, per category, the records belonging to
//! it by their index (`k<N>` for verification methods, `s<N>` for services).
//! Records are written root first, then verification methods, then services,
//! so that equal documents always produce identical bytes.
use std::collections::{HashMap, HashSet};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::{
    dns::{self, TxtRecord},
    document::{Service, VerificationMethod, VerificationRelationship},
    jwk::{self, KeyType},
    Document,
};

/// Maximum size of a BEP44 mutable item value.
pub const MAX_PACKET_SIZE: usize = 1000;

/// Name of the root record.
pub const ROOT_RECORD_NAME: &str = "_did.";

const ALSO_KNOWN_AS_RECORD_NAME: &str = "_aka._did.";
const CONTROLLER_RECORD_NAME: &str = "_cnt._did.";

/// Encoding version written in the root record.
const VERSION: &str = "0";

const FIELD_SEPARATOR: char = ';';
const LIST_SEPARATOR: char = ',';

/// Error raised when a document cannot be encoded.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("`{0}` has no fragment")]
    MissingFragment(String),

    #[error("`{0}` is not an id of the document")]
    ForeignId(String),

    #[error("duplicate id `{0}`")]
    DuplicateId(String),

    #[error("{relationship} references unknown verification method `{id}`")]
    UnknownVerificationMethod {
        relationship: &'static str,
        id: String,
    },

    #[error("value `{0}` contains a reserved separator")]
    ReservedCharacter(String),

    #[error("invalid key for `{0}`: {1}")]
    Key(String, jwk::Error),

    #[error(transparent)]
    Dns(#[from] dns::Error),

    #[error("encoded document is {0} bytes, more than {MAX_PACKET_SIZE}")]
    TooLarge(usize),
}

/// Error raised when bytes cannot be decoded into a document.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Dns(#[from] dns::Error),

    #[error("malformed field `{field}` in record `{record}`")]
    MalformedField { record: String, field: String },

    #[error("missing field `{field}` in record `{record}`")]
    MissingField { record: String, field: &'static str },

    #[error("duplicate record `{0}`")]
    DuplicateRecord(String),

    #[error("missing root record")]
    MissingRoot,

    #[error("unsupported encoding version `{0}`")]
    UnsupportedVersion(String),

    #[error("invalid index `{0}`")]
    InvalidIndex(String),

    #[error("index `{0}` listed more than once")]
    DuplicateIndex(String),

    #[error("unresolved index `{0}`")]
    UnresolvedIndex(String),

    #[error("invalid key type `{0}`")]
    InvalidKeyType(String),

    #[error("invalid key in record `{0}`: {1}")]
    Key(String, jwk::Error),

    #[error("invalid base64 in record `{0}`")]
    Base64(String),
}

/// One `TXT` record of a `did:dht` packet, with its text split into
/// `key=value` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRecord {
    pub name: String,
    pub fields: Vec<(String, String)>,
}

impl WireRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    /// Value of the first field with the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, key: &'static str) -> Result<&str, DecodeError> {
        self.get(key).ok_or_else(|| DecodeError::MissingField {
            record: self.name.clone(),
            field: key,
        })
    }

    /// Record text: fields joined with `;`.
    pub fn text(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Splits a record text into its fields.
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self, DecodeError> {
        let name = name.into();
        let mut fields = Vec::new();
        if !text.is_empty() {
            for field in text.split(FIELD_SEPARATOR) {
                match field.split_once('=') {
                    Some((k, v)) if !k.is_empty() => fields.push((k.to_string(), v.to_string())),
                    _ => {
                        return Err(DecodeError::MalformedField {
                            record: name,
                            field: field.to_string(),
                        })
                    }
                }
            }
        }
        Ok(Self { name, fields })
    }
}

/// Ordered list of records, root record first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WirePacket {
    pub records: Vec<WireRecord>,
}

impl WirePacket {
    /// The root record, if any.
    pub fn root(&self) -> Option<&WireRecord> {
        self.record(ROOT_RECORD_NAME)
    }

    pub fn record(&self, name: &str) -> Option<&WireRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// DNS message bytes for this packet.
    pub fn to_bytes(&self) -> Result<Vec<u8>, dns::Error> {
        let answers: Vec<_> = self
            .records
            .iter()
            .map(|r| TxtRecord::new(r.name.as_str(), r.text()))
            .collect();
        dns::write_message(&answers)
    }

    /// Reads a packet from DNS message bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let records = dns::read_message(bytes)?
            .into_iter()
            .map(|r| WireRecord::parse(r.name, &r.text))
            .collect::<Result<_, _>>()?;
        Ok(Self { records })
    }
}

/// Category key of each verification relationship in the root record.
fn relationship_key(relationship: VerificationRelationship) -> &'static str {
    match relationship {
        VerificationRelationship::Authentication => "auth",
        VerificationRelationship::AssertionMethod => "asm",
        VerificationRelationship::KeyAgreement => "agm",
        VerificationRelationship::CapabilityInvocation => "inv",
        VerificationRelationship::CapabilityDelegation => "del",
    }
}

fn record_name(index: &str) -> String {
    format!("_{index}._did.")
}

fn check_value(value: &str) -> Result<&str, EncodeError> {
    if value.contains(FIELD_SEPARATOR) {
        Err(EncodeError::ReservedCharacter(value.to_string()))
    } else {
        Ok(value)
    }
}

fn check_list<'a>(values: impl IntoIterator<Item = &'a String>) -> Result<String, EncodeError> {
    let mut items = Vec::new();
    for value in values {
        if value.contains(LIST_SEPARATOR) {
            return Err(EncodeError::ReservedCharacter(value.clone()));
        }
        items.push(check_value(value)?);
    }
    Ok(items.join(","))
}

/// Fragment of a verification method or service id. The id is either
/// relative (`#fragment`) or based on the document id.
fn fragment<'a>(did: &str, id: &'a str) -> Result<&'a str, EncodeError> {
    match id.split_once('#') {
        Some((base, _)) if !base.is_empty() && base != did => {
            Err(EncodeError::ForeignId(id.to_string()))
        }
        Some((_, fragment)) if !fragment.is_empty() => check_value(fragment),
        _ => Err(EncodeError::MissingFragment(id.to_string())),
    }
}

/// Encodes a document into its packet form.
pub fn encode(document: &Document) -> Result<WirePacket, EncodeError> {
    let mut vm_indexes = HashMap::new();
    let mut vm_records = Vec::with_capacity(document.verification_method.len());
    for (i, vm) in document.verification_method.iter().enumerate() {
        let index = format!("k{i}");
        if vm_indexes
            .insert(absolute_id(&document.id, &vm.id), index.clone())
            .is_some()
        {
            return Err(EncodeError::DuplicateId(vm.id.clone()));
        }
        vm_records.push(encode_verification_method(document, vm, &index)?);
    }

    let mut service_ids = HashSet::new();
    let mut service_records = Vec::with_capacity(document.service.len());
    for (i, service) in document.service.iter().enumerate() {
        if !service_ids.insert(absolute_id(&document.id, &service.id)) {
            return Err(EncodeError::DuplicateId(service.id.clone()));
        }
        service_records.push(encode_service(document, service, &format!("s{i}"))?);
    }

    let mut root = WireRecord::new(ROOT_RECORD_NAME).with("v", VERSION);
    if !vm_records.is_empty() {
        let indexes: Vec<_> = (0..vm_records.len()).map(|i| format!("k{i}")).collect();
        root = root.with("vm", indexes.join(","));
    }
    for relationship in VerificationRelationship::ALL {
        let ids = document.verification_relationships.get(relationship);
        if ids.is_empty() {
            continue;
        }
        let indexes = ids
            .iter()
            .map(|id| {
                let absolute = absolute_id(&document.id, id);
                vm_indexes.get(absolute.as_str()).cloned().ok_or_else(|| {
                    EncodeError::UnknownVerificationMethod {
                        relationship: relationship.name(),
                        id: id.clone(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        root = root.with(relationship_key(relationship), indexes.join(","));
    }
    if !service_records.is_empty() {
        let indexes: Vec<_> = (0..service_records.len()).map(|i| format!("s{i}")).collect();
        root = root.with("svc", indexes.join(","));
    }

    let mut records = Vec::with_capacity(1 + vm_records.len() + service_records.len() + 2);
    records.push(root);
    records.extend(vm_records);
    records.extend(service_records);
    if !document.also_known_as.is_empty() {
        records.push(
            WireRecord::new(ALSO_KNOWN_AS_RECORD_NAME)
                .with("aka", check_list(&document.also_known_as)?),
        );
    }
    if !document.controller.is_empty() {
        records.push(
            WireRecord::new(CONTROLLER_RECORD_NAME).with("cnt", check_list(&document.controller)?),
        );
    }

    Ok(WirePacket { records })
}

/// Resolves `#fragment` references against the document id.
fn absolute_id(did: &str, id: &str) -> String {
    if id.starts_with('#') {
        format!("{did}{id}")
    } else {
        id.to_string()
    }
}

fn encode_verification_method(
    document: &Document,
    vm: &VerificationMethod,
    index: &str,
) -> Result<WireRecord, EncodeError> {
    let key_error = |e| EncodeError::Key(vm.id.clone(), e);
    let key_type = KeyType::of(&vm.public_key_jwk).map_err(key_error)?;
    let key = key_type.serialize(&vm.public_key_jwk).map_err(key_error)?;

    let mut record = WireRecord::new(record_name(index))
        .with("id", fragment(&document.id, &vm.id)?)
        .with("t", key_type.index().to_string())
        .with("k", URL_SAFE_NO_PAD.encode(key));
    if vm.controller != document.id {
        record = record.with("c", check_value(&vm.controller)?);
    }
    Ok(record)
}

fn encode_service(
    document: &Document,
    service: &Service,
    index: &str,
) -> Result<WireRecord, EncodeError> {
    Ok(WireRecord::new(record_name(index))
        .with("id", fragment(&document.id, &service.id)?)
        .with("t", check_value(&service.type_)?)
        .with("se", check_list(&service.service_endpoint)?))
}

/// Encodes a document into DNS message bytes.
pub fn to_bytes(document: &Document) -> Result<Vec<u8>, EncodeError> {
    let bytes = encode(document)?.to_bytes()?;
    if bytes.len() > MAX_PACKET_SIZE {
        return Err(EncodeError::TooLarge(bytes.len()));
    }
    Ok(bytes)
}

/// Decodes DNS message bytes into the document of the given DID.
///
/// The DID is not part of the packet; it is used to build the absolute ids
/// of verification methods and services.
pub fn from_bytes(bytes: &[u8], did: &str) -> Result<Document, DecodeError> {
    decode(&WirePacket::from_bytes(bytes)?, did)
}

/// Splits a comma separated list, an empty value being an empty list.
fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(LIST_SEPARATOR)
        .filter(move |_| !value.is_empty())
}

/// Checks that `token` is `<prefix><decimal>`.
fn check_index<'a>(token: &'a str, prefix: char) -> Result<&'a str, DecodeError> {
    match token.strip_prefix(prefix) {
        Some(n) if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => Ok(token),
        _ => Err(DecodeError::InvalidIndex(token.to_string())),
    }
}

/// Decodes a packet into the document of the given DID.
pub fn decode(packet: &WirePacket, did: &str) -> Result<Document, DecodeError> {
    let mut records = HashMap::with_capacity(packet.records.len());
    for record in &packet.records {
        if records.insert(record.name.as_str(), record).is_some() {
            return Err(DecodeError::DuplicateRecord(record.name.clone()));
        }
    }

    let root = records
        .get(ROOT_RECORD_NAME)
        .ok_or(DecodeError::MissingRoot)?;
    if let Some(version) = root.get("v") {
        if version != VERSION {
            return Err(DecodeError::UnsupportedVersion(version.to_string()));
        }
    }

    let lookup = |index: &str| {
        records
            .get(record_name(index).as_str())
            .copied()
            .ok_or_else(|| DecodeError::UnresolvedIndex(index.to_string()))
    };

    let mut document = Document::new(did);

    let mut vm_ids = HashMap::new();
    for index in split_list(root.get("vm").unwrap_or_default()) {
        let index = check_index(index, 'k')?;
        let vm = decode_verification_method(lookup(index)?, did)?;
        if vm_ids.insert(index, vm.id.clone()).is_some() {
            return Err(DecodeError::DuplicateIndex(index.to_string()));
        }
        document.verification_method.push(vm);
    }

    for relationship in VerificationRelationship::ALL {
        let Some(value) = root.get(relationship_key(relationship)) else {
            continue;
        };
        let ids = document.verification_relationships.get_mut(relationship);
        for index in split_list(value) {
            let id = vm_ids
                .get(index)
                .ok_or_else(|| DecodeError::UnresolvedIndex(index.to_string()))?;
            ids.push(id.clone());
        }
    }

    let mut service_indexes = HashSet::new();
    for index in split_list(root.get("svc").unwrap_or_default()) {
        let index = check_index(index, 's')?;
        if !service_indexes.insert(index) {
            return Err(DecodeError::DuplicateIndex(index.to_string()));
        }
        document.service.push(decode_service(lookup(index)?, did)?);
    }

    if let Some(record) = records.get(ALSO_KNOWN_AS_RECORD_NAME) {
        document.also_known_as = split_list(record.require("aka")?)
            .map(ToOwned::to_owned)
            .collect();
    }
    if let Some(record) = records.get(CONTROLLER_RECORD_NAME) {
        document.controller = split_list(record.require("cnt")?)
            .map(ToOwned::to_owned)
            .collect();
    }

    Ok(document)
}

fn decode_verification_method(
    record: &WireRecord,
    did: &str,
) -> Result<VerificationMethod, DecodeError> {
    let fragment = record.require("id")?;
    let t = record.require("t")?;
    let key_type = t
        .parse::<u8>()
        .map_err(|_| DecodeError::InvalidKeyType(t.to_string()))
        .and_then(|i| {
            KeyType::from_index(i).map_err(|e| DecodeError::Key(record.name.clone(), e))
        })?;
    let key = URL_SAFE_NO_PAD
        .decode(record.require("k")?)
        .map_err(|_| DecodeError::Base64(record.name.clone()))?;
    let jwk = key_type
        .parse(&key)
        .map_err(|e| DecodeError::Key(record.name.clone(), e))?
        .with_key_id(fragment);
    let controller = record.get("c").unwrap_or(did);

    Ok(VerificationMethod::new(
        format!("{did}#{fragment}"),
        controller,
        jwk,
    ))
}

fn decode_service(record: &WireRecord, did: &str) -> Result<Service, DecodeError> {
    let fragment = record.require("id")?;
    Ok(Service {
        id: format!("{did}#{fragment}"),
        type_: record.require("t")?.to_string(),
        service_endpoint: split_list(record.require("se")?)
            .map(ToOwned::to_owned)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwk::{Base64urlUInt, OctetParams, Params, JWK};

    const DID: &str = "did:dht:cwxob5rbhhu3z9x3gfqy6cthqgm6ngrh4k8s615n7pw11czoq4fy";

    fn ed25519_key(seed: u8, kid: &str) -> JWK {
        let key = ed25519_dalek::SigningKey::from_bytes(&[seed; 32]).verifying_key();
        JWK::from(key).with_key_id(kid)
    }

    fn key_bytes(jwk: &JWK) -> Vec<u8> {
        KeyType::of(jwk).unwrap().serialize(jwk).unwrap()
    }

    fn document() -> Document {
        let mut doc = Document::new(DID);
        doc.verification_method = vec![
            VerificationMethod::new(format!("{DID}#0"), DID, ed25519_key(1, "0")),
            VerificationMethod::new(format!("{DID}#sig"), DID, ed25519_key(2, "sig")),
        ];
        let rel = &mut doc.verification_relationships;
        rel.authentication = vec![format!("{DID}#0")];
        rel.assertion_method = vec![format!("{DID}#sig"), format!("{DID}#0")];
        rel.capability_invocation = vec![format!("{DID}#0")];
        doc.service = vec![Service {
            id: format!("{DID}#dwn"),
            type_: "DecentralizedWebNode".to_string(),
            service_endpoint: vec![
                "https://example.com/dwn".to_string(),
                "https://example.org/dwn".to_string(),
            ],
        }];
        doc
    }

    #[test]
    fn root_record() {
        let packet = encode(&document()).unwrap();
        let names: Vec<_> = packet.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["_did.", "_k0._did.", "_k1._did.", "_s0._did."]);
        assert_eq!(
            packet.root().unwrap().text(),
            "v=0;vm=k0,k1;auth=k0;asm=k1,k0;inv=k0;svc=s0"
        );
        assert_eq!(
            packet.record("_s0._did.").unwrap().text(),
            "id=dwn;t=DecentralizedWebNode;se=https://example.com/dwn,https://example.org/dwn"
        );
        let k1 = packet.record("_k1._did.").unwrap();
        assert_eq!(k1.get("id"), Some("sig"));
        assert_eq!(k1.get("t"), Some("0"));
        assert_eq!(k1.get("c"), None);
    }

    #[test]
    fn roundtrip() {
        let doc = document();
        let bytes = to_bytes(&doc).unwrap();
        assert_eq!(from_bytes(&bytes, DID).unwrap(), doc);
    }

    #[test]
    fn order_is_significant() {
        let doc = document();
        let mut swapped = doc.clone();
        swapped.verification_relationships.assertion_method.reverse();
        assert_ne!(to_bytes(&doc).unwrap(), to_bytes(&swapped).unwrap());
        assert_eq!(from_bytes(&to_bytes(&swapped).unwrap(), DID).unwrap(), swapped);
    }

    #[test]
    fn also_known_as_and_controllers() {
        let mut doc = document();
        doc.also_known_as = vec!["did:example:alias".to_string()];
        doc.controller = vec![DID.to_string(), "did:example:other".to_string()];
        doc.verification_method[1].controller = "did:example:other".to_string();
        let packet = encode(&doc).unwrap();
        assert_eq!(
            packet.record("_cnt._did.").unwrap().text(),
            format!("cnt={DID},did:example:other")
        );
        assert_eq!(packet.record("_k1._did.").unwrap().get("c"), Some("did:example:other"));
        assert_eq!(from_bytes(&to_bytes(&doc).unwrap(), DID).unwrap(), doc);
    }

    #[test]
    fn relative_references() {
        let mut doc = document();
        doc.verification_relationships.key_agreement = vec!["#sig".to_string()];
        let packet = encode(&doc).unwrap();
        assert_eq!(packet.root().unwrap().get("agm"), Some("k1"));
    }

    #[test]
    fn encode_rejects_dangling_reference() {
        let mut doc = document();
        doc.verification_relationships.key_agreement = vec![format!("{DID}#missing")];
        assert!(matches!(
            encode(&doc),
            Err(EncodeError::UnknownVerificationMethod { .. })
        ));
    }

    #[test]
    fn encode_rejects_missing_fragment() {
        let mut doc = document();
        doc.verification_method[0].id = DID.to_string();
        assert!(matches!(
            encode(&doc),
            Err(EncodeError::MissingFragment(_))
        ));
    }

    #[test]
    fn encode_rejects_separators() {
        let mut doc = document();
        doc.service[0].type_ = "a;b".to_string();
        assert!(matches!(
            encode(&doc),
            Err(EncodeError::ReservedCharacter(_))
        ));

        let mut doc = document();
        doc.service[0].service_endpoint = vec!["https://a.example/?x=1,2".to_string()];
        assert!(matches!(
            encode(&doc),
            Err(EncodeError::ReservedCharacter(_))
        ));
    }

    #[test]
    fn encode_rejects_large_documents() {
        let mut doc = document();
        doc.service = (0..20)
            .map(|i| Service {
                id: format!("{DID}#service-{i}"),
                type_: "LinkedDomains".to_string(),
                service_endpoint: vec![format!("https://service-{i}.example.com/")],
            })
            .collect();
        assert!(matches!(to_bytes(&doc), Err(EncodeError::TooLarge(_))));
    }

    fn packet(records: &[(&str, &str)]) -> Vec<u8> {
        let answers: Vec<_> = records
            .iter()
            .map(|(name, text)| TxtRecord::new(*name, *text))
            .collect();
        dns::write_message(&answers).unwrap()
    }

    #[test]
    fn decode_minimal() {
        let key = URL_SAFE_NO_PAD.encode(key_bytes(&ed25519_key(1, "0")));
        let bytes = packet(&[
            ("_did.", "vm=k0;auth=k0"),
            ("_k0._did.", &format!("id=0;t=0;k={key}")),
        ]);
        let doc = from_bytes(&bytes, DID).unwrap();
        assert_eq!(doc.verification_method.len(), 1);
        assert_eq!(doc.verification_method[0].public_key_jwk, ed25519_key(1, "0"));
        assert_eq!(doc.verification_relationships.authentication, [format!("{DID}#0")]);
    }

    #[test]
    fn decode_failures() {
        let key = URL_SAFE_NO_PAD.encode(key_bytes(&ed25519_key(1, "0")));
        let k0 = format!("id=0;t=0;k={key}");
        let cases: Vec<(Vec<u8>, &str)> = vec![
            (b"not a dns message".to_vec(), "dns"),
            (packet(&[("_k0._did.", &k0)]), "missing root"),
            (packet(&[("_did.", "v=1")]), "version"),
            (
                packet(&[("_did.", "vm=k1"), ("_k0._did.", &k0)]),
                "unresolved vm",
            ),
            (
                packet(&[("_did.", "vm=k0;auth=k1"), ("_k0._did.", &k0)]),
                "unresolved auth",
            ),
            (packet(&[("_did.", "vm=x0"), ("_k0._did.", &k0)]), "bad index"),
            (
                packet(&[("_did.", "vm=k0,k0"), ("_k0._did.", &k0)]),
                "duplicate index",
            ),
            (
                packet(&[("_did.", "vm=k0"), ("_did.", "vm=k0"), ("_k0._did.", &k0)]),
                "duplicate record",
            ),
            (
                packet(&[("_did.", "vm=k0"), ("_k0._did.", "id=0;t=9;k=AAAA")]),
                "key type",
            ),
            (
                packet(&[("_did.", "vm=k0"), ("_k0._did.", "id=0;t=0;k=!!")]),
                "base64",
            ),
            (
                packet(&[("_did.", "vm=k0"), ("_k0._did.", "id=0;t=0;k=AAAA")]),
                "key length",
            ),
            (packet(&[("_did.", "vm=k0"), ("_k0._did.", "t=0")]), "missing field"),
            (packet(&[("_did.", "vm;k0")]), "malformed field"),
            (packet(&[("_did.", "svc=s0")]), "unresolved service"),
        ];
        for (bytes, case) in cases {
            assert!(from_bytes(&bytes, DID).is_err(), "{case}");
        }
    }

    fn okp_key(curve: &str, x: [u8; 32], kid: &str) -> JWK {
        JWK::from(Params::OKP(OctetParams {
            curve: curve.to_string(),
            public_key: Base64urlUInt(x.to_vec()),
        }))
        .with_key_id(kid)
    }

    #[test]
    fn ed25519_keys_are_not_point_checked() {
        for b in 0..=20u8 {
            let mut doc = Document::new(DID);
            doc.verification_method = vec![VerificationMethod::new(
                format!("{DID}#0"),
                DID,
                okp_key("Ed25519", [b; 32], "0"),
            )];
            doc.verification_relationships.authentication = vec![format!("{DID}#0")];
            let bytes = to_bytes(&doc).unwrap();
            assert_eq!(from_bytes(&bytes, DID).unwrap(), doc, "x=[{b}; 32]");
        }
    }

    #[test]
    fn all_key_types() {
        let mut keys = vec![
            ("0", ed25519_key(1, "0"), "0"),
            ("enc", okp_key("X25519", [9; 32], "enc"), "3"),
        ];
        #[cfg(feature = "secp256k1")]
        {
            use k256::elliptic_curve::sec1::ToEncodedPoint;
            let pk = k256::SecretKey::from_slice(&[1u8; 32]).unwrap().public_key();
            let jwk = KeyType::Secp256k1
                .parse(pk.to_encoded_point(true).as_bytes())
                .unwrap();
            keys.push(("k1", jwk.with_key_id("k1"), "1"));
        }
        #[cfg(feature = "secp256r1")]
        {
            use p256::elliptic_curve::sec1::ToEncodedPoint;
            let pk = p256::SecretKey::from_slice(&[1u8; 32]).unwrap().public_key();
            let jwk = KeyType::P256
                .parse(pk.to_encoded_point(true).as_bytes())
                .unwrap();
            keys.push(("r1", jwk.with_key_id("r1"), "2"));
        }

        let mut doc = Document::new(DID);
        for (fragment, jwk, _) in &keys {
            doc.verification_method.push(VerificationMethod::new(
                format!("{DID}#{fragment}"),
                DID,
                jwk.clone(),
            ));
            doc.verification_relationships
                .assertion_method
                .push(format!("{DID}#{fragment}"));
        }
        doc.verification_relationships.key_agreement = vec![format!("{DID}#enc")];

        let packet = encode(&doc).unwrap();
        let types: Vec<_> = packet.records[1..].iter().map(|r| r.get("t")).collect();
        let expected: Vec<_> = keys.iter().map(|(_, _, t)| Some(*t)).collect();
        assert_eq!(types, expected);

        let decoded = from_bytes(&to_bytes(&doc).unwrap(), DID).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn key_id_and_algorithm_are_not_encoded() {
        let mut jwk = ed25519_key(1, "other");
        jwk.algorithm = Some("EdDSA".to_string());
        let mut doc = Document::new(DID);
        doc.verification_method = vec![VerificationMethod::new(format!("{DID}#0"), DID, jwk)];

        let decoded = from_bytes(&to_bytes(&doc).unwrap(), DID).unwrap();
        let decoded_jwk = &decoded.verification_method[0].public_key_jwk;
        assert_eq!(decoded_jwk.key_id.as_deref(), Some("0"));
        assert_eq!(decoded_jwk.algorithm, None);
        assert_eq!(decoded_jwk, &ed25519_key(1, "0"));
    }

    #[test]
    fn encode_rejects_foreign_ids() {
        let mut doc = document();
        doc.verification_method[1].id = "did:example:other#0".to_string();
        assert!(matches!(
            encode(&doc),
            Err(EncodeError::ForeignId(id)) if id == "did:example:other#0"
        ));

        let mut doc = document();
        doc.service[0].id = "did:example:other#dwn".to_string();
        assert!(matches!(encode(&doc), Err(EncodeError::ForeignId(_))));
    }

    #[test]
    fn relative_ids() {
        let mut doc = document();
        doc.verification_method[0].id = "#0".to_string();
        doc.service[0].id = "#dwn".to_string();
        let decoded = from_bytes(&to_bytes(&doc).unwrap(), DID).unwrap();
        assert_eq!(decoded, document());
    }
}
