use serde_cbor::Value;

use crate::claims::{CommonClaims, Credential};
use crate::cose::SignedStructure;
use crate::error::DecodeError;
use crate::header::{HeaderMap, ProtectedHeader};

/// Everything a decode produced, stage by stage.
///
/// Each stage fills its field before the next one runs, so on failure the
/// fields of every earlier stage are still set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    /// The QR code text as given.
    pub raw_text: String,
    /// The character after `HC1`, normally `:`.
    pub separator: Option<char>,
    /// Base45 text with the header and trailing whitespace removed.
    pub envelope_body: String,
    /// Result of base45 decoding, still compressed.
    pub base45_decoded: Vec<u8>,
    /// The inflated CWT.
    pub inflated: Vec<u8>,
    /// The outer CBOR tag, recorded whatever its value.
    pub cose_tag: Option<u64>,
    /// The whole tagged message as a value tree.
    pub tagged_message: Option<Value>,
    pub signed: Option<SignedStructure>,
    pub protected_header: Option<ProtectedHeader>,
    /// The claims as a value tree, before typed decoding.
    pub payload_value: Option<Value>,
    pub claims: Option<CommonClaims>,
    /// Problems later stages worked around.
    pub degraded: Vec<DecodeError>,
    /// Filled when typed claims decoding failed.
    pub diagnose_lines: Vec<String>,
}

impl Decoded {
    pub(crate) fn new(raw_text: &str) -> Self {
        Decoded {
            raw_text: raw_text.to_string(),
            ..Decoded::default()
        }
    }

    pub fn claims(&self) -> Option<&CommonClaims> {
        self.claims.as_ref()
    }

    /// The Digital Covid Certificate inside the record, if any.
    pub fn credential(&self) -> Option<&Credential> {
        self.claims.as_ref().and_then(CommonClaims::credential)
    }

    pub fn unprotected_header(&self) -> Option<&HeaderMap> {
        self.signed.as_ref().map(|s| &s.unprotected)
    }

    /// Raw signature bytes, for a verifier to check separately.
    pub fn signature(&self) -> Option<&[u8]> {
        self.signed.as_ref().map(|s| s.signature.as_slice())
    }

    pub fn is_complete(&self) -> bool {
        self.claims.is_some()
    }
}
