use std::fmt;

use thiserror::Error;

use crate::output::Decoded;

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Envelope,
    Radix45,
    Inflate,
    Cose,
    ProtectedHeader,
    Claims,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Envelope => "envelope",
            Stage::Radix45 => "base45",
            Stage::Inflate => "inflate",
            Stage::Cose => "cose",
            Stage::ProtectedHeader => "protected header",
            Stage::Claims => "claims",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("envelope: {0}")]
    BadEnvelope(String),

    #[error("base45: {0}")]
    BadEncoding(String),

    #[error("inflate: {0}")]
    BadCompression(String),

    #[error("cose: CBOR tagged message number must be {expected} got={got}")]
    UnsupportedMessageType { got: u64, expected: u64 },

    #[error("cose: malformed COSE_Sign1 structure: {cause} hex={hex}")]
    MalformedSignedStructure { cause: String, hex: String },

    #[error("protected header: {cause} hex={hex}")]
    MalformedProtectedHeader { cause: String, hex: String },

    #[error("claims: {cause} hex={hex}")]
    MalformedClaims { cause: String, hex: String },
}

impl DecodeError {
    pub fn stage(&self) -> Stage {
        match self {
            DecodeError::BadEnvelope(_) => Stage::Envelope,
            DecodeError::BadEncoding(_) => Stage::Radix45,
            DecodeError::BadCompression(_) => Stage::Inflate,
            DecodeError::UnsupportedMessageType { .. }
            | DecodeError::MalformedSignedStructure { .. } => Stage::Cose,
            DecodeError::MalformedProtectedHeader { .. } => Stage::ProtectedHeader,
            DecodeError::MalformedClaims { .. } => Stage::Claims,
        }
    }

    /// Fatal errors halt the pipeline. A malformed protected header only
    /// does when not even the generic header map could be read; otherwise
    /// it ends up in `Decoded::degraded`.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DecodeError::MalformedProtectedHeader { .. })
    }

    pub(crate) fn signed_structure(cause: impl fmt::Display, bytes: &[u8]) -> Self {
        DecodeError::MalformedSignedStructure {
            cause: cause.to_string(),
            hex: hex::encode(bytes),
        }
    }

    pub(crate) fn protected_header(cause: impl fmt::Display, bytes: &[u8]) -> Self {
        DecodeError::MalformedProtectedHeader {
            cause: cause.to_string(),
            hex: hex::encode(bytes),
        }
    }

    pub(crate) fn claims(cause: impl fmt::Display, bytes: &[u8]) -> Self {
        DecodeError::MalformedClaims {
            cause: cause.to_string(),
            hex: hex::encode(bytes),
        }
    }
}

/// A decode that stopped early. `output` holds every stage that completed
/// before `error`.
#[derive(Debug, Error)]
#[error("decoding stopped at {} stage: {error}", .error.stage())]
pub struct PartialDecode {
    pub output: Box<Decoded>,
    #[source]
    pub error: DecodeError,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be an unsigned integer, got {value:?}")]
    NotANumber { var: &'static str, value: String },
}
