//! COSE header maps.
//!
//! Issuers disagree on what goes in the headers, so every label is kept in a
//! generic map and the typed view (`alg`, `kid`) is derived from it on top.

use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;

use serde_cbor::Value;
use tracing::{debug, warn};

use crate::error::DecodeError;

pub const ALG_LABEL: i64 = 1;
pub const KID_LABEL: i64 = 4;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum HeaderLabel {
    Int(i64),
    Text(String),
}

impl fmt::Display for HeaderLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderLabel::Int(i) => write!(f, "{}", i),
            HeaderLabel::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Algorithm identifier, an int or a text string per RFC 8152.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Algorithm {
    Int(i64),
    Text(String),
}

impl Algorithm {
    /// IANA name for the algorithms seen in health certificates.
    pub fn name(&self) -> Option<&str> {
        match self {
            Algorithm::Int(-7) => Some("ES256"),
            Algorithm::Int(-35) => Some("ES384"),
            Algorithm::Int(-36) => Some("ES512"),
            Algorithm::Int(-37) => Some("PS256"),
            Algorithm::Int(-38) => Some("PS384"),
            Algorithm::Int(-39) => Some("PS512"),
            Algorithm::Int(-8) => Some("EdDSA"),
            Algorithm::Int(_) => None,
            Algorithm::Text(s) => Some(s),
        }
    }
}

/// The header labels this decoder understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoseHeader {
    pub alg: Option<Algorithm>,
    pub kid: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMap(BTreeMap<HeaderLabel, Value>);

impl HeaderMap {
    pub fn from_value(value: Value) -> Result<Self, String> {
        let entries = match value {
            Value::Map(entries) => entries,
            other => return Err(format!("header expected map got={}", kind_of(&other))),
        };

        let mut map = BTreeMap::new();
        for (key, value) in entries {
            let label = match key {
                Value::Integer(i) => i64::try_from(i)
                    .map(HeaderLabel::Int)
                    .map_err(|_| format!("header label {} out of range", i))?,
                Value::Text(s) => HeaderLabel::Text(s),
                other => {
                    return Err(format!(
                        "header label expected int or text got={}",
                        kind_of(&other)
                    ))
                }
            };
            map.insert(label, value);
        }

        Ok(HeaderMap(map))
    }

    pub fn get(&self, label: i64) -> Option<&Value> {
        self.0.get(&HeaderLabel::Int(label))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderLabel, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Labels other than `alg` and `kid`.
    pub fn unknown_labels(&self) -> impl Iterator<Item = &HeaderLabel> {
        self.0.keys().filter(|label| {
            !matches!(label, HeaderLabel::Int(ALG_LABEL) | HeaderLabel::Int(KID_LABEL))
        })
    }

    pub fn typed(&self) -> Result<CoseHeader, String> {
        let alg = match self.get(ALG_LABEL) {
            None => None,
            Some(Value::Integer(i)) => Some(Algorithm::Int(
                i64::try_from(*i).map_err(|_| format!("alg {} out of range", i))?,
            )),
            Some(Value::Text(s)) => Some(Algorithm::Text(s.clone())),
            Some(other) => {
                return Err(format!("alg expected int or text got={}", kind_of(other)))
            }
        };

        let kid = match self.get(KID_LABEL) {
            None => None,
            Some(Value::Bytes(b)) => Some(b.clone()),
            Some(other) => return Err(format!("kid expected bytes got={}", kind_of(other))),
        };

        Ok(CoseHeader { alg, kid })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProtectedHeader {
    /// The bstr as found in the message.
    pub encoded: Vec<u8>,
    /// Every label, known or not.
    pub map: HeaderMap,
    /// `None` when the known labels had unexpected types.
    pub typed: Option<CoseHeader>,
}

/// Decodes the protected header bstr.
///
/// Bytes that are not a CBOR map are an error. A failed typed view is not:
/// the generic map is returned together with the error, for the caller to
/// record.
pub fn decode_protected(
    encoded: &[u8],
) -> Result<(ProtectedHeader, Option<DecodeError>), DecodeError> {
    if encoded.is_empty() {
        return Ok((
            ProtectedHeader {
                typed: Some(CoseHeader::default()),
                ..ProtectedHeader::default()
            },
            None,
        ));
    }

    let value: Value = serde_cbor::from_slice(encoded)
        .map_err(|e| DecodeError::protected_header(e, encoded))?;
    let map =
        HeaderMap::from_value(value).map_err(|e| DecodeError::protected_header(e, encoded))?;

    let (typed, degraded) = match map.typed() {
        Ok(typed) => (Some(typed), None),
        Err(cause) => {
            warn!(%cause, "protected header has unexpected types, keeping generic map");
            (None, Some(DecodeError::protected_header(cause, encoded)))
        }
    };

    debug!(labels = map.len(), "decoded protected header");

    Ok((
        ProtectedHeader {
            encoded: encoded.to_vec(),
            map,
            typed,
        },
        degraded,
    ))
}

/// Short name of a CBOR value's runtime kind, for messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Integer(i) if *i >= 0 => "unsigned integer",
        Value::Integer(_) => "negative integer",
        Value::Float(_) => "float",
        Value::Bytes(_) => "bytes",
        Value::Text(_) => "text",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Tag(_, _) => "tag",
        _ => "unknown",
    }
}
