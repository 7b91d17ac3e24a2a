use core::fmt;
use std::str::FromStr;

/// Error raised when a string is not a DID (or DID URL).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid DID `{0}`: {1}")]
pub struct InvalidDID(pub String, pub Unexpected);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub struct Unexpected(pub usize, pub Option<u8>);

impl fmt::Display for Unexpected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            Some(b) => write!(f, "unexpected byte {b} at offset {0:#04x}", self.0),
            None => write!(f, "unexpected end at offset {0:#04x}", self.0),
        }
    }
}

/// Parsed DID.
///
/// Accepts plain DIDs (`did:<method>:<method-specific-id>`) as well as DID
/// URLs carrying a path, query or fragment after the method specific
/// identifier. The original input is kept verbatim in [`DID::uri`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DID {
    uri: String,
    method: String,
    method_specific_id: String,
    path: Option<String>,
    query: Option<String>,
    fragment: Option<String>,
}

impl DID {
    /// Parses the input as a DID or DID URL.
    ///
    /// See: <https://www.w3.org/TR/did-core/#did-syntax>
    pub fn parse(uri: &str) -> Result<Self, InvalidDID> {
        let bytes = uri.as_bytes();
        let end = validate(bytes).map_err(|e| InvalidDID(uri.to_string(), e))?;

        // `validate` guarantees `did:<method>:` followed by a non-empty id.
        let method_end = 4 + bytes[4..end]
            .iter()
            .position(|b| *b == b':')
            .ok_or_else(|| InvalidDID(uri.to_string(), Unexpected(end, None)))?;
        let method = &uri[4..method_end];
        let method_specific_id = &uri[method_end + 1..end];

        let (path, query, fragment) = split_url(&uri[end..]).map_err(|offset| {
            let i = end + offset;
            InvalidDID(uri.to_string(), Unexpected(i, bytes.get(i).copied()))
        })?;

        Ok(Self {
            uri: uri.to_string(),
            method: method.to_string(),
            method_specific_id: method_specific_id.to_string(),
            path,
            query,
            fragment,
        })
    }

    /// Input string, as given to [`DID::parse`].
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Method name, verbatim from the second colon-delimited segment.
    pub fn method_name(&self) -> &str {
        &self.method
    }

    pub fn method_specific_id(&self) -> &str {
        &self.method_specific_id
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Returns `true` if the input was a bare DID, without any DID URL part.
    pub fn is_bare(&self) -> bool {
        self.path.is_none() && self.query.is_none() && self.fragment.is_none()
    }

    /// The bare DID, without path, query or fragment.
    pub fn did(&self) -> String {
        format!("did:{}:{}", self.method, self.method_specific_id)
    }
}

impl FromStr for DID {
    type Err = InvalidDID;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.uri.fmt(f)
    }
}

/// Validates the DID prefix of `data`, returning the offset at which the DID
/// ends.
fn validate(data: &[u8]) -> Result<usize, Unexpected> {
    enum State {
        Scheme1,         // d
        Scheme2,         // i
        Scheme3,         // d
        SchemeSeparator, // :
        MethodNameStart,
        MethodName,
        MethodSpecificIdStartOrSeparator,
        MethodSpecificIdPct1,
        MethodSpecificIdPct2,
        MethodSpecificId,
    }

    fn is_method_char(b: u8) -> bool {
        matches!(b, 0x61..=0x7a) || b.is_ascii_digit()
    }

    fn is_id_char(b: u8) -> bool {
        b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_')
    }

    let mut state = State::Scheme1;
    let mut i = 0;
    loop {
        let c = data.get(i).copied();
        match state {
            State::Scheme1 => match c {
                Some(b'd') => state = State::Scheme2,
                c => break Err(Unexpected(i, c)),
            },
            State::Scheme2 => match c {
                Some(b'i') => state = State::Scheme3,
                c => break Err(Unexpected(i, c)),
            },
            State::Scheme3 => match c {
                Some(b'd') => state = State::SchemeSeparator,
                c => break Err(Unexpected(i, c)),
            },
            State::SchemeSeparator => match c {
                Some(b':') => state = State::MethodNameStart,
                c => break Err(Unexpected(i, c)),
            },
            State::MethodNameStart => match c {
                Some(c) if is_method_char(c) => state = State::MethodName,
                c => break Err(Unexpected(i, c)),
            },
            State::MethodName => match c {
                Some(b':') => state = State::MethodSpecificIdStartOrSeparator,
                Some(c) if is_method_char(c) => (),
                c => break Err(Unexpected(i, c)),
            },
            State::MethodSpecificIdStartOrSeparator => match c {
                Some(b':') => (),
                Some(b'%') => state = State::MethodSpecificIdPct1,
                Some(c) if is_id_char(c) => state = State::MethodSpecificId,
                c => break Err(Unexpected(i, c)),
            },
            State::MethodSpecificIdPct1 => match c {
                Some(c) if c.is_ascii_hexdigit() => state = State::MethodSpecificIdPct2,
                c => break Err(Unexpected(i, c)),
            },
            State::MethodSpecificIdPct2 => match c {
                Some(c) if c.is_ascii_hexdigit() => state = State::MethodSpecificId,
                c => break Err(Unexpected(i, c)),
            },
            State::MethodSpecificId => match c {
                Some(b':') => state = State::MethodSpecificIdStartOrSeparator,
                Some(b'%') => state = State::MethodSpecificIdPct1,
                Some(c) if is_id_char(c) => (),
                _ => break Ok(i),
            },
        }

        i += 1
    }
}

type UrlParts = (Option<String>, Option<String>, Option<String>);

/// Splits what follows the DID into path, query and fragment.
///
/// On error, returns the offset of the offending byte.
fn split_url(rest: &str) -> Result<UrlParts, usize> {
    if rest.is_empty() {
        return Ok((None, None, None));
    }

    if !rest.starts_with(['/', '?', '#']) {
        return Err(0);
    }

    let (before_fragment, fragment) = match rest.split_once('#') {
        Some((a, b)) => (a, Some(b.to_string())),
        None => (rest, None),
    };
    let (path, query) = match before_fragment.split_once('?') {
        Some((a, b)) => (a, Some(b.to_string())),
        None => (before_fragment, None),
    };
    let path = (!path.is_empty()).then(|| path.to_string());

    Ok((path, query, fragment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_did_accept() {
        let vectors = [
            "did:method:foo",
            "did:a:b",
            "did:dht:cwxob5rbhhu3z9x3gfqy6cthqgm6ngrh4k8s615n7pw11czoq4fy",
            "did:web:example.com%3A443:u:bob",
        ];

        for input in vectors {
            let did = DID::parse(input).unwrap();
            assert!(did.is_bare());
            assert_eq!(did.did(), input);
        }
    }

    #[test]
    fn parse_did_reject() {
        let vectors = [
            "not-a-did",
            "http:a:b",
            "did::b",
            "did:a:",
            "did:a",
            "did:A:b",
            "did:a:b c",
            "did:a:%zz",
            "",
        ];

        for input in vectors {
            assert!(DID::parse(input).is_err(), "{input}")
        }
    }

    #[test]
    fn method_and_id() {
        let did = DID::parse("did:web:example.com%3A443:u:bob").unwrap();
        assert_eq!(did.method_name(), "web");
        assert_eq!(did.method_specific_id(), "example.com%3A443:u:bob");
        assert_eq!(did.uri(), "did:web:example.com%3A443:u:bob");
    }

    #[test]
    fn parse_did_url() {
        let did = DID::parse("did:dht:abc/some/path?versionId=2#0").unwrap();
        assert_eq!(did.method_name(), "dht");
        assert_eq!(did.method_specific_id(), "abc");
        assert_eq!(did.path(), Some("/some/path"));
        assert_eq!(did.query(), Some("versionId=2"));
        assert_eq!(did.fragment(), Some("0"));
        assert_eq!(did.did(), "did:dht:abc");
        assert!(!did.is_bare());

        let did = DID::parse("did:dht:abc#key-1").unwrap();
        assert_eq!(did.path(), None);
        assert_eq!(did.fragment(), Some("key-1"));
    }
}
