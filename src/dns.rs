//! DNS message framing for `did:dht` packets.
//!
//! A `did:dht` document is stored as the answer section of a DNS response
//! message made only of `TXT` records (RFC 1035). Messages are built and
//! parsed with [`hickory_proto`]; this module only maps them to and from
//! name/text pairs.
use hickory_proto::{
    error::ProtoError,
    op::{Message, MessageType, OpCode},
    rr::{rdata::TXT, DNSClass, Name, RData, Record},
};

/// TTL given to every record.
pub const DEFAULT_TTL: u32 = 7200;

/// Maximum length of a single TXT character-string.
const MAX_CHARACTER_STRING_LENGTH: usize = 255;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Proto(#[from] ProtoError),

    #[error("TXT data of record `{0}` is not UTF-8")]
    NotUtf8(String),
}

/// `TXT` resource record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxtRecord {
    /// Owner name, in its absolute textual form (`_k0._did.`).
    pub name: String,

    pub ttl: u32,

    /// Concatenation of the record character-strings.
    pub text: String,
}

impl TxtRecord {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ttl: DEFAULT_TTL,
            text: text.into(),
        }
    }
}

/// Writes an authoritative DNS response message holding the given answers.
///
/// Text longer than 255 bytes is split into several character-strings.
pub fn write_message(answers: &[TxtRecord]) -> Result<Vec<u8>, Error> {
    let mut message = Message::new();
    message
        .set_id(0)
        .set_message_type(MessageType::Response)
        .set_op_code(OpCode::Query)
        .set_authoritative(true);

    for answer in answers {
        let name = Name::from_ascii(&answer.name)?;
        let strings: Vec<&[u8]> = if answer.text.is_empty() {
            vec![b"".as_slice()]
        } else {
            answer
                .text
                .as_bytes()
                .chunks(MAX_CHARACTER_STRING_LENGTH)
                .collect()
        };
        message.add_answer(Record::from_rdata(
            name,
            answer.ttl,
            RData::TXT(TXT::from_bytes(strings)),
        ));
    }

    Ok(message.to_vec()?)
}

/// Reads the `TXT` answers of a DNS message.
///
/// Answers of any other type or class are skipped.
pub fn read_message(data: &[u8]) -> Result<Vec<TxtRecord>, Error> {
    let message = Message::from_vec(data)?;

    let mut records = Vec::with_capacity(message.answers().len());
    for record in message.answers() {
        let mut name = record.name().to_ascii();
        if !name.ends_with('.') {
            name.push('.');
        }

        let txt = match record.data() {
            Some(RData::TXT(txt)) if record.dns_class() == DNSClass::IN => txt,
            _ => {
                log::debug!(
                    "skipping record `{name}` of type {} class {}",
                    record.record_type(),
                    record.dns_class()
                );
                continue;
            }
        };

        let bytes: Vec<u8> = txt.txt_data().iter().flat_map(|s| s.iter().copied()).collect();
        let text = String::from_utf8(bytes).map_err(|_| Error::NotUtf8(name.clone()))?;
        records.push(TxtRecord {
            name,
            ttl: record.ttl(),
            text,
        });
    }

    Ok(records)
}
