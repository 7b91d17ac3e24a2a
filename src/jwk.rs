//! Public JSON Web Keys, as embedded in `did:dht` verification methods.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

/// Error type for key conversions.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Key type is not supported
    #[error("Key type not supported: '{0}'")]
    UnsupportedKeyType(String),
    /// Curve not implemented
    #[error("Curve not implemented: '{0}'")]
    CurveNotImplemented(String),
    /// Unknown `did:dht` key type index
    #[error("Unknown key type index: {0}")]
    UnknownKeyTypeIndex(u8),
    /// Invalid key length
    #[error("Invalid key length: {0}")]
    InvalidKeyLength(usize),
    /// Key bytes do not encode a point on the curve
    #[error("Invalid public key")]
    InvalidPublicKey,
}

/// Public JWK.
///
/// Only the public parameters are modelled: `did:dht` documents never carry
/// private key material.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct JWK {
    #[serde(rename = "kid")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(rename = "alg")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(flatten)]
    pub params: Params,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(tag = "kty")]
pub enum Params {
    EC(ECParams),
    OKP(OctetParams),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct ECParams {
    #[serde(rename = "crv")]
    pub curve: String,
    #[serde(rename = "x")]
    pub x_coordinate: Base64urlUInt,
    #[serde(rename = "y")]
    pub y_coordinate: Base64urlUInt,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct OctetParams {
    #[serde(rename = "crv")]
    pub curve: String,
    #[serde(rename = "x")]
    pub public_key: Base64urlUInt,
}

/// Bytes serialized as unpadded base64url.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
#[serde(into = "String")]
pub struct Base64urlUInt(pub Vec<u8>);

impl TryFrom<String> for Base64urlUInt {
    type Error = base64::DecodeError;

    fn try_from(data: String) -> Result<Self, Self::Error> {
        Ok(Base64urlUInt(URL_SAFE_NO_PAD.decode(data)?))
    }
}

impl From<&Base64urlUInt> for String {
    fn from(data: &Base64urlUInt) -> String {
        URL_SAFE_NO_PAD.encode(&data.0)
    }
}

impl From<Base64urlUInt> for String {
    fn from(data: Base64urlUInt) -> String {
        String::from(&data)
    }
}

impl JWK {
    /// Key type (`kty`) of this key.
    pub fn key_type(&self) -> &'static str {
        match self.params {
            Params::EC(_) => "EC",
            Params::OKP(_) => "OKP",
        }
    }

    /// Curve (`crv`) of this key.
    pub fn curve(&self) -> &str {
        match &self.params {
            Params::EC(params) => &params.curve,
            Params::OKP(params) => &params.curve,
        }
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

impl From<Params> for JWK {
    fn from(params: Params) -> Self {
        Self {
            key_id: None,
            algorithm: None,
            params,
        }
    }
}

impl From<ed25519_dalek::VerifyingKey> for JWK {
    fn from(key: ed25519_dalek::VerifyingKey) -> Self {
        Params::OKP(OctetParams {
            curve: "Ed25519".to_string(),
            public_key: Base64urlUInt(key.to_bytes().to_vec()),
        })
        .into()
    }
}

/// Length of Ed25519 and X25519 public keys.
const OKP_KEY_LENGTH: usize = 32;

/// Key types of the `did:dht` key type registry.
///
/// The discriminant is the index stored in the `t` field of a verification
/// method record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum KeyType {
    Ed25519 = 0,
    Secp256k1 = 1,
    P256 = 2,
    X25519 = 3,
}

impl KeyType {
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Result<Self, Error> {
        match index {
            0 => Ok(Self::Ed25519),
            1 => Ok(Self::Secp256k1),
            2 => Ok(Self::P256),
            3 => Ok(Self::X25519),
            i => Err(Error::UnknownKeyTypeIndex(i)),
        }
    }

    /// Registry entry matching the `kty`/`crv` pair of the given key.
    pub fn of(jwk: &JWK) -> Result<Self, Error> {
        match &jwk.params {
            Params::OKP(params) => match params.curve.as_str() {
                "Ed25519" => Ok(Self::Ed25519),
                "X25519" => Ok(Self::X25519),
                crv => Err(Error::CurveNotImplemented(crv.to_string())),
            },
            Params::EC(params) => match params.curve.as_str() {
                "secp256k1" => Ok(Self::Secp256k1),
                "P-256" => Ok(Self::P256),
                crv => Err(Error::CurveNotImplemented(crv.to_string())),
            },
        }
    }

    /// Compact binary form of the public key: raw bytes for OKP keys, SEC1
    /// compressed point for EC keys.
    pub fn serialize(self, jwk: &JWK) -> Result<Vec<u8>, Error> {
        match (self, &jwk.params) {
            (Self::Ed25519 | Self::X25519, Params::OKP(params)) => {
                let bytes = &params.public_key.0;
                if bytes.len() != OKP_KEY_LENGTH {
                    return Err(Error::InvalidKeyLength(bytes.len()));
                }
                Ok(bytes.clone())
            }
            #[cfg(feature = "secp256k1")]
            (Self::Secp256k1, Params::EC(params)) => serialize_secp256k1(params),
            #[cfg(feature = "secp256r1")]
            (Self::P256, Params::EC(params)) => serialize_p256(params),
            _ => Err(Error::UnsupportedKeyType(format!(
                "{}/{}",
                jwk.key_type(),
                jwk.curve()
            ))),
        }
    }

    /// Rebuilds the public JWK from its compact binary form.
    pub fn parse(self, data: &[u8]) -> Result<JWK, Error> {
        match self {
            Self::Ed25519 => okp_parse("Ed25519", data),
            Self::X25519 => okp_parse("X25519", data),
            #[cfg(feature = "secp256k1")]
            Self::Secp256k1 => secp256k1_parse(data),
            #[cfg(feature = "secp256r1")]
            Self::P256 => p256_parse(data),
            #[allow(unreachable_patterns)]
            other => Err(Error::UnsupportedKeyType(format!("{other:?}"))),
        }
    }
}

/// Raw 32-byte OKP public key. The bytes are taken as-is, without checking
/// that they encode a curve point, as done when serializing.
fn okp_parse(curve: &str, data: &[u8]) -> Result<JWK, Error> {
    if data.len() != OKP_KEY_LENGTH {
        return Err(Error::InvalidKeyLength(data.len()));
    }
    Ok(Params::OKP(OctetParams {
        curve: curve.to_string(),
        public_key: Base64urlUInt(data.to_vec()),
    })
    .into())
}

#[cfg(feature = "secp256k1")]
pub fn secp256k1_parse(data: &[u8]) -> Result<JWK, Error> {
    use k256::elliptic_curve::sec1::ToEncodedPoint;
    let pk = k256::PublicKey::from_sec1_bytes(data).map_err(|_| Error::InvalidPublicKey)?;
    let ec_points = pk.to_encoded_point(false);
    let x = ec_points.x().ok_or(Error::InvalidPublicKey)?;
    let y = ec_points.y().ok_or(Error::InvalidPublicKey)?;
    Ok(Params::EC(ECParams {
        curve: "secp256k1".to_string(),
        x_coordinate: Base64urlUInt(x.to_vec()),
        y_coordinate: Base64urlUInt(y.to_vec()),
    })
    .into())
}

#[cfg(feature = "secp256r1")]
pub fn p256_parse(data: &[u8]) -> Result<JWK, Error> {
    use p256::elliptic_curve::sec1::ToEncodedPoint;
    let pk = p256::PublicKey::from_sec1_bytes(data).map_err(|_| Error::InvalidPublicKey)?;
    let ec_points = pk.to_encoded_point(false);
    let x = ec_points.x().ok_or(Error::InvalidPublicKey)?;
    let y = ec_points.y().ok_or(Error::InvalidPublicKey)?;
    Ok(Params::EC(ECParams {
        curve: "P-256".to_string(),
        x_coordinate: Base64urlUInt(x.to_vec()),
        y_coordinate: Base64urlUInt(y.to_vec()),
    })
    .into())
}

const EC_UNCOMPRESSED_POINT_TAG: &[u8] = &[0x04];

/// Serialize a secp256k1 public key as a 33-byte string with point compression.
#[cfg(feature = "secp256k1")]
pub fn serialize_secp256k1(params: &ECParams) -> Result<Vec<u8>, Error> {
    use k256::elliptic_curve::sec1::ToEncodedPoint;
    let pk_data = [
        EC_UNCOMPRESSED_POINT_TAG,
        params.x_coordinate.0.as_slice(),
        params.y_coordinate.0.as_slice(),
    ]
    .concat();
    let pk = k256::PublicKey::from_sec1_bytes(&pk_data).map_err(|_| Error::InvalidPublicKey)?;
    Ok(pk.to_encoded_point(true).as_bytes().to_vec())
}

/// Serialize a P-256 public key as a 33-byte string with point compression.
#[cfg(feature = "secp256r1")]
pub fn serialize_p256(params: &ECParams) -> Result<Vec<u8>, Error> {
    use p256::elliptic_curve::sec1::ToEncodedPoint;
    let pk_data = [
        EC_UNCOMPRESSED_POINT_TAG,
        params.x_coordinate.0.as_slice(),
        params.y_coordinate.0.as_slice(),
    ]
    .concat();
    let pk = p256::PublicKey::from_sec1_bytes(&pk_data).map_err(|_| Error::InvalidPublicKey)?;
    Ok(pk.to_encoded_point(true).as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ED25519_JSON: &str = r#"{
        "kty": "OKP",
        "crv": "Ed25519",
        "kid": "0",
        "x": "ZR8A7IHnJ5v9-TFcDzI8cZfhGJzSj29LYutpKTLwdoo"
    }"#;

    #[test]
    fn ed25519_json() {
        let jwk: JWK = serde_json::from_str(ED25519_JSON).unwrap();
        assert_eq!(jwk.key_type(), "OKP");
        assert_eq!(jwk.curve(), "Ed25519");
        assert_eq!(jwk.key_id.as_deref(), Some("0"));
        assert_eq!(KeyType::of(&jwk).unwrap(), KeyType::Ed25519);

        let bytes = KeyType::Ed25519.serialize(&jwk).unwrap();
        assert_eq!(bytes.len(), 32);
        let parsed = KeyType::Ed25519.parse(&bytes).unwrap().with_key_id("0");
        assert_eq!(parsed, jwk);

        let value = serde_json::to_value(&jwk).unwrap();
        assert_eq!(value["x"], "ZR8A7IHnJ5v9-TFcDzI8cZfhGJzSj29LYutpKTLwdoo");
        assert_eq!(value["kty"], "OKP");
    }

    #[test]
    #[cfg(feature = "secp256r1")]
    fn p256_compression() {
        let jwk: JWK = serde_json::from_value(serde_json::json!({
            "kty": "EC",
            "crv": "P-256",
            "x": "UmzXjEZzlGmpaM_CmFEJtOO5JBntW8yl_fM1LEQlWQ4",
            "y": "OmoZmcbUadg7dEC8bg5kXryN968CJqv2UFMUKRERZ6s"
        }))
        .unwrap();
        let key_type = KeyType::of(&jwk).unwrap();
        assert_eq!(key_type, KeyType::P256);
        let compressed = key_type.serialize(&jwk).unwrap();
        assert_eq!(compressed.len(), 33);
        assert_eq!(key_type.parse(&compressed).unwrap(), jwk);
    }

    #[test]
    #[cfg(feature = "secp256k1")]
    fn secp256k1_compression() {
        // Generator point of secp256k1.
        let compressed = [
            0x02, 0x79, 0xbe, 0x66, 0x7e, 0xf9, 0xdc, 0xbb, 0xac, 0x55, 0xa0, 0x62, 0x95, 0xce,
            0x87, 0x0b, 0x07, 0x02, 0x9b, 0xfc, 0xdb, 0x2d, 0xce, 0x28, 0xd9, 0x59, 0xf2, 0x81,
            0x5b, 0x16, 0xf8, 0x17, 0x98,
        ];
        let jwk = KeyType::Secp256k1.parse(&compressed).unwrap();
        assert_eq!(jwk.curve(), "secp256k1");
        assert_eq!(KeyType::of(&jwk).unwrap(), KeyType::Secp256k1);
        assert_eq!(KeyType::Secp256k1.serialize(&jwk).unwrap(), compressed);
    }

    #[test]
    fn unknown_index() {
        assert!(matches!(
            KeyType::from_index(9),
            Err(Error::UnknownKeyTypeIndex(9))
        ));
        for key_type in [
            KeyType::Ed25519,
            KeyType::Secp256k1,
            KeyType::P256,
            KeyType::X25519,
        ] {
            assert_eq!(KeyType::from_index(key_type.index()).unwrap(), key_type);
        }
    }

    #[test]
    fn unsupported_curve() {
        let jwk: JWK = Params::OKP(OctetParams {
            curve: "Ed448".to_string(),
            public_key: Base64urlUInt(vec![0; 57]),
        })
        .into();
        assert!(matches!(
            KeyType::of(&jwk),
            Err(Error::CurveNotImplemented(_))
        ));
    }

    #[test]
    fn okp_rejects_bad_length() {
        assert!(matches!(
            KeyType::Ed25519.parse(&[1, 2, 3]),
            Err(Error::InvalidKeyLength(3))
        ));
        assert!(matches!(
            KeyType::X25519.parse(&[0; 33]),
            Err(Error::InvalidKeyLength(33))
        ));
    }

    #[test]
    fn okp_keys_are_raw_bytes() {
        // Bytes are kept as given, point or not.
        let data = [2u8; 32];
        let jwk = KeyType::Ed25519.parse(&data).unwrap();
        assert_eq!(KeyType::of(&jwk).unwrap(), KeyType::Ed25519);
        assert_eq!(KeyType::Ed25519.serialize(&jwk).unwrap(), data);

        let jwk = KeyType::X25519.parse(&data).unwrap();
        assert_eq!(jwk.key_type(), "OKP");
        assert_eq!(jwk.curve(), "X25519");
        assert_eq!(KeyType::of(&jwk).unwrap(), KeyType::X25519);
        assert_eq!(KeyType::X25519.serialize(&jwk).unwrap(), data);
    }
}
