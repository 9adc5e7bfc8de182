//! CWT claims and the EU DCC payload carried in the `hcert` claim.
//!
//! See <https://ec.europa.eu/health/sites/default/files/ehealth/docs/digital-green-certificates_v3_en.pdf>
//! section 2.6.3 and RFC 8392 section 4 for the claim keys.

use std::collections::BTreeMap;
use std::convert::TryFrom;

use serde::de::Deserializer;
use serde_cbor::value::{from_value, to_value};
use serde_cbor::Value;
use serde_derive::{Deserialize, Serialize};

use crate::header::kind_of;
use crate::numeric::Numeric;

pub const ISS_CLAIM_KEY: i128 = 1;
pub const EXP_CLAIM_KEY: i128 = 4;
pub const IAT_CLAIM_KEY: i128 = 6;
pub const HCERT_CLAIM_KEY: i128 = -260;

/// The only key of the hcert map with a defined meaning.
pub const DCC: u64 = 1;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Name {
    /// Surname(s).
    #[serde(rename = "fn", default)]
    pub surname: String,
    /// Surname(s) transliterated ICAO 9303 style, `A-Z` and `<` only.
    #[serde(rename = "fnt", default)]
    pub surname_transliterated: String,
    /// Skipped when the holder has no forename.
    #[serde(rename = "gn", default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(rename = "gnt", default, skip_serializing_if = "Option::is_none")]
    pub given_name_transliterated: Option<String>,
}

impl Name {
    pub fn full_name(&self) -> String {
        match self.given_name.as_deref() {
            Some(given) if !given.is_empty() => format!("{} {}", given, self.surname),
            _ => self.surname.clone(),
        }
    }
}

/// One vaccination event.
///
/// Every field is mandatory in the human readable schema, but issuers do
/// leave some out, so missing fields decode to their default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VaccinationEntry {
    /// Disease or agent targeted, value set `disease-agent-targeted`.
    #[serde(rename = "tg", default)]
    pub disease_targeted: String,
    /// Value set `vaccine-prophylaxis`.
    #[serde(rename = "vp", default)]
    pub vaccine_type: String,
    /// Value set `vaccine-medicinal-product`.
    #[serde(rename = "mp", default)]
    pub medicinal_product: String,
    /// Value set `vaccine-mah-manf`.
    #[serde(rename = "ma", default)]
    pub marketing_auth_holder: String,
    #[serde(rename = "dn", default)]
    pub dose_number: Numeric,
    #[serde(rename = "sd", default)]
    pub total_doses: Numeric,
    /// `YYYY-MM-DD`
    #[serde(rename = "dt", default)]
    pub date: String,
    #[serde(rename = "co", default)]
    pub country: String,
    #[serde(rename = "is", default)]
    pub issuer: String,
    /// The UVCI.
    #[serde(rename = "ci", default)]
    pub certificate_id: String,
}

impl VaccinationEntry {
    pub fn dose_number(&self) -> i64 {
        self.dose_number.truncate()
    }

    pub fn total_doses(&self) -> i64 {
        self.total_doses.truncate()
    }
}

/// The Digital Covid Certificate found under hcert key 1.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Credential {
    #[serde(rename = "ver", default)]
    pub version: String,
    #[serde(rename = "dob", default)]
    pub date_of_birth: String,
    #[serde(rename = "nam", default)]
    pub name: Name,
    /// A `null` array decodes as empty.
    #[serde(
        rename = "v",
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub vaccinations: Vec<VaccinationEntry>,
    /// Test entries, passed through untouched.
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<Value>,
    /// Recovery entries, passed through untouched.
    #[serde(rename = "r", default, skip_serializing_if = "Option::is_none")]
    pub recoveries: Option<Value>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    let entries: Option<Vec<T>> = serde::Deserialize::deserialize(deserializer)?;
    Ok(entries.unwrap_or_default())
}

/// The `hcert` claim: a map keyed by unsigned integers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthCertificate {
    dcc: Option<Credential>,
    /// Keys other than 1, kept raw.
    pub reserved: BTreeMap<u64, Value>,
}

impl HealthCertificate {
    pub fn new(dcc: Credential) -> Self {
        HealthCertificate {
            dcc: Some(dcc),
            reserved: BTreeMap::new(),
        }
    }

    pub fn dcc(&self) -> Option<&Credential> {
        self.dcc.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonClaims {
    pub issuer: String,
    /// Seconds since the epoch.
    pub issued_at: u64,
    /// Seconds since the epoch.
    pub expiry: u64,
    pub health_certificate: HealthCertificate,
}

impl CommonClaims {
    pub fn credential(&self) -> Option<&Credential> {
        self.health_certificate.dcc()
    }

    /// Decodes the claims from an already parsed payload.
    ///
    /// Errors name the claim path that did not fit.
    pub fn from_value(payload: &Value) -> Result<Self, String> {
        let claims = match payload {
            Value::Map(m) => m,
            other => return Err(format!("payload expected map got={}", kind_of(other))),
        };

        let issuer = match claims.get(&Value::Integer(ISS_CLAIM_KEY)) {
            None => String::new(),
            Some(Value::Text(s)) => s.clone(),
            Some(other) => return Err(format!("iss expected text got={}", kind_of(other))),
        };
        let expiry = timestamp(claims.get(&Value::Integer(EXP_CLAIM_KEY)), "exp")?;
        let issued_at = timestamp(claims.get(&Value::Integer(IAT_CLAIM_KEY)), "iat")?;

        let health_certificate = match claims.get(&Value::Integer(HCERT_CLAIM_KEY)) {
            None => HealthCertificate::default(),
            Some(hcert) => health_certificate(hcert)?,
        };

        Ok(CommonClaims {
            issuer,
            issued_at,
            expiry,
            health_certificate,
        })
    }

    /// CBOR encodes the claims back into the CWT integer keyed map.
    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        let mut hcert = BTreeMap::new();
        if let Some(dcc) = self.credential() {
            hcert.insert(Value::Integer(DCC as i128), to_value(dcc)?);
        }
        for (key, value) in &self.health_certificate.reserved {
            hcert.insert(Value::Integer(*key as i128), value.clone());
        }

        let mut claims = BTreeMap::new();
        claims.insert(Value::Integer(ISS_CLAIM_KEY), Value::Text(self.issuer.clone()));
        claims.insert(Value::Integer(EXP_CLAIM_KEY), Value::Integer(self.expiry as i128));
        claims.insert(Value::Integer(IAT_CLAIM_KEY), Value::Integer(self.issued_at as i128));
        claims.insert(Value::Integer(HCERT_CLAIM_KEY), Value::Map(hcert));

        serde_cbor::to_vec(&Value::Map(claims))
    }
}

fn timestamp(value: Option<&Value>, claim: &str) -> Result<u64, String> {
    match value {
        None => Ok(0),
        Some(Value::Integer(i)) => {
            u64::try_from(*i).map_err(|_| format!("{} expected unsigned integer got={}", claim, i))
        }
        Some(other) => Err(format!(
            "{} expected unsigned integer got={}",
            claim,
            kind_of(other)
        )),
    }
}

fn health_certificate(hcert: &Value) -> Result<HealthCertificate, String> {
    let entries = match hcert {
        Value::Map(m) => m,
        other => return Err(format!("hcert expected map got={}", kind_of(other))),
    };

    let mut decoded = HealthCertificate::default();
    for (key, value) in entries {
        let key = match key {
            Value::Integer(i) if *i >= 0 && *i <= u64::MAX as i128 => *i as u64,
            other => {
                return Err(format!(
                    "hcert key expected unsigned integer got={}",
                    kind_of(other)
                ))
            }
        };

        if key == DCC {
            if *value == Value::Null {
                continue;
            }
            let dcc = from_value(value.clone()).map_err(|e| format!("hcert[1]: {}", e))?;
            decoded.dcc = Some(dcc);
        } else {
            decoded.reserved.insert(key, value.clone());
        }
    }

    Ok(decoded)
}
