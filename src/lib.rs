//! Decoder for EU Digital COVID Certificates (the `HC1:` QR code payload).
//!
//! Decoding stops at the claims: the COSE signature is exposed but not
//! verified.

pub mod claims;
pub mod config;
pub mod cose;
pub mod diagnose;
pub mod envelope;
pub mod error;
pub mod eudcc;
pub mod header;
pub mod inflate;
pub mod numeric;
pub mod output;
pub mod radix45;
pub mod valueset;

pub use claims::{CommonClaims, Credential, HealthCertificate, Name, VaccinationEntry};
pub use config::Config;
pub use error::{DecodeError, PartialDecode, Stage};
pub use eudcc::{decode, looks_like_credential};
pub use header::{Algorithm, CoseHeader, HeaderLabel, HeaderMap, ProtectedHeader};
pub use numeric::Numeric;
pub use output::Decoded;
pub use valueset::{ValueSetMapper, ValueSetValue};
