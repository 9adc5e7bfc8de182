//! COSE_Sign1 structure, see RFC 8152 section 4.2.
//!
//! ```text
//! COSE_Sign1_Tagged = #6.18([
//!     protected : bstr .cbor header_map / bstr .size 0,
//!     unprotected : header_map,
//!     payload : bstr / nil,
//!     signature : bstr
//! ])
//! ```

use serde_cbor::Value;
use tracing::debug;

use crate::error::DecodeError;
use crate::header::{kind_of, HeaderMap};

/// CBOR tag of a COSE single signer data object.
pub const COSE_SIGN1_TAG: u64 = 18;

/// The outer CBOR tag and whatever it wraps.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedMessage {
    pub tag: u64,
    pub content: Value,
}

/// The four elements of a COSE_Sign1, in wire order. Absent byte strings
/// are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignedStructure {
    /// CBOR encoded protected header map, still wrapped.
    pub protected: Vec<u8>,
    pub unprotected: HeaderMap,
    /// CBOR encoded CWT claims.
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Reads the outer tag, whatever its number.
pub fn decode_tagged(inflated: &[u8]) -> Result<TaggedMessage, DecodeError> {
    let value: Value = serde_cbor::from_slice(inflated)
        .map_err(|e| DecodeError::signed_structure(format!("invalid CBOR: {}", e), inflated))?;

    match value {
        Value::Tag(tag, content) => {
            debug!(tag, "read CBOR tagged message");
            Ok(TaggedMessage {
                tag,
                content: *content,
            })
        }
        other => Err(DecodeError::signed_structure(
            format!("expected a CBOR tagged message got={}", kind_of(&other)),
            inflated,
        )),
    }
}

/// Destructures a tag 18 message into its four elements.
pub fn decode_signed(
    message: &TaggedMessage,
    inflated: &[u8],
) -> Result<SignedStructure, DecodeError> {
    if message.tag != COSE_SIGN1_TAG {
        return Err(DecodeError::UnsupportedMessageType {
            got: message.tag,
            expected: COSE_SIGN1_TAG,
        });
    }

    let elements = match &message.content {
        Value::Array(elements) => elements,
        other => {
            return Err(DecodeError::signed_structure(
                format!("COSE_Sign1 expected array got={}", kind_of(other)),
                inflated,
            ))
        }
    };

    let (protected, unprotected, payload, signature) = match elements.as_slice() {
        [protected, unprotected, payload, signature] => {
            (protected, unprotected, payload, signature)
        }
        _ => {
            return Err(DecodeError::signed_structure(
                format!("COSE_Sign1 expected 4 elements got={}", elements.len()),
                inflated,
            ))
        }
    };

    let protected = byte_string(protected, "protected header", inflated)?;
    let unprotected = HeaderMap::from_value(unprotected.clone()).map_err(|e| {
        element_error(format!("unprotected header: {}", e), unprotected, inflated)
    })?;
    let payload = byte_string(payload, "payload", inflated)?;
    let signature = byte_string(signature, "signature", inflated)?;

    debug!(
        protected = protected.len(),
        unprotected = unprotected.len(),
        payload = payload.len(),
        signature = signature.len(),
        "decoded COSE_Sign1"
    );

    Ok(SignedStructure {
        protected,
        unprotected,
        payload,
        signature,
    })
}

fn byte_string(value: &Value, element: &str, inflated: &[u8]) -> Result<Vec<u8>, DecodeError> {
    match value {
        Value::Bytes(b) => Ok(b.clone()),
        Value::Null => Ok(Vec::new()),
        other => Err(element_error(
            format!("{} expected bytes got={}", element, kind_of(other)),
            other,
            inflated,
        )),
    }
}

/// Dumps the encoding of the element that did not fit, or the whole message
/// if it cannot be re-encoded.
fn element_error(cause: String, element: &Value, inflated: &[u8]) -> DecodeError {
    match serde_cbor::to_vec(element) {
        Ok(bytes) => DecodeError::signed_structure(cause, &bytes),
        Err(_) => DecodeError::signed_structure(cause, inflated),
    }
}
