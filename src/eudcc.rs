//! Decoding of an EU Digital COVID Certificate from its QR code text.
//!
//! 1. check and strip the `HC1:` header
//! 2. base45 decode
//! 3. zlib inflate to get a CBOR Web Token
//! 4. read the COSE_Sign1 structure (tag 18)
//! 5. CBOR decode the protected header
//! 6. CBOR decode the payload into the claims, diagnosing it on failure
//!
//! The signature is not verified.

use serde_cbor::Value;
use tracing::{debug, warn};

use crate::claims::CommonClaims;
use crate::config::Config;
use crate::cose;
use crate::diagnose;
use crate::envelope;
use crate::error::{DecodeError, PartialDecode};
use crate::header;
use crate::inflate::inflate;
use crate::output::Decoded;
use crate::radix45;

pub use crate::envelope::looks_like_credential;

/// Runs the whole pipeline over the QR code text.
///
/// On failure the returned [`PartialDecode`] still carries the output of
/// every stage that completed.
pub fn decode(data: &str, config: &Config) -> Result<Decoded, PartialDecode> {
    let mut output = Decoded::new(data);

    match run(data, config, &mut output) {
        Ok(()) => Ok(output),
        Err(error) => {
            debug!(stage = %error.stage(), %error, "decoding stopped");
            Err(PartialDecode {
                output: Box::new(output),
                error,
            })
        }
    }
}

fn run(data: &str, config: &Config, output: &mut Decoded) -> Result<(), DecodeError> {
    let envelope = envelope::parse(data)?;
    output.separator = Some(envelope.separator);
    output.envelope_body = envelope.body.to_string();

    output.base45_decoded = radix45::decode(envelope.body)?;
    stage_done(config, "base45", &output.base45_decoded);

    output.inflated = inflate(&output.base45_decoded, config.max_inflated_len)?;
    stage_done(config, "inflate", &output.inflated);

    let message = cose::decode_tagged(&output.inflated)?;
    output.cose_tag = Some(message.tag);
    let signed = cose::decode_signed(&message, &output.inflated);
    output.tagged_message = Some(Value::Tag(message.tag, Box::new(message.content)));
    let signed = signed?;

    let protected = signed.protected.clone();
    let payload = signed.payload.clone();
    output.signed = Some(signed);

    let (protected_header, degraded) = header::decode_protected(&protected)?;
    output.protected_header = Some(protected_header);
    output.degraded.extend(degraded);

    let payload_value: Value = match serde_cbor::from_slice(&payload) {
        Ok(value) => value,
        Err(e) => {
            let cause = format!("payload is not valid CBOR: {}", e);
            return Err(claims_failed(config, output, cause, &payload));
        }
    };
    let claims = CommonClaims::from_value(&payload_value);
    output.payload_value = Some(payload_value);

    match claims {
        Ok(claims) => {
            debug!(
                issuer = %claims.issuer,
                iat = claims.issued_at,
                exp = claims.expiry,
                "decoded claims"
            );
            output.claims = Some(claims);
            Ok(())
        }
        Err(cause) => Err(claims_failed(config, output, cause, &payload)),
    }
}

fn claims_failed(
    config: &Config,
    output: &mut Decoded,
    cause: String,
    payload: &[u8],
) -> DecodeError {
    warn!(%cause, "typed claims decoding failed, diagnosing payload");

    output.diagnose_lines = diagnose::diagnose_claims(payload, &cause);
    if config.logs_diagnostics() {
        for line in &output.diagnose_lines {
            warn!("{}", line);
        }
    }

    DecodeError::claims(cause, payload)
}

fn stage_done(config: &Config, stage: &str, bytes: &[u8]) {
    debug!(stage, len = bytes.len(), "stage done");
    if config.logs_hex() {
        debug!(stage, hex = %hex::encode(bytes));
    }
}

#[test]
fn decode_test() {
    use crate::claims::{Credential, Name, VaccinationEntry};
    use crate::numeric::Numeric;

    // Taken from:
    // https://github.com/eu-digital-green-certificates/dgc-testdata/blob/main/IT/2DCode/raw/1.json
    // It is licensed under Apache-2.0 License.
    let vaccine_record_data = "HC1:6BFOXN%TS3DH0YOJ58S S-W5HDC *M0II5XHC9B5G2+$N IOP-IA%NFQGRJPC%OQHIZC4.OI1RM8ZA.A5:S9MKN4NN3F85QNCY0O%0VZ001HOC9JU0D0HT0HB2PL/IB*09B9LW4T*8+DCMH0LDK2%K:XFE70*LP$V25$0Q:J:4MO1P0%0L0HD+9E/HY+4J6TH48S%4K.GJ2PT3QY:GQ3TE2I+-CPHN6D7LLK*2HG%89UV-0LZ 2ZJJ524-LH/CJTK96L6SR9MU9DHGZ%P WUQRENS431T1XCNCF+47AY0-IFO0500TGPN8F5G.41Q2E4T8ALW.INSV$ 07UV5SR+BNQHNML7 /KD3TU 4V*CAT3ZGLQMI/XI%ZJNSBBXK2:UG%UJMI:TU+MMPZ5$/PMX19UE:-PSR3/$NU44CBE6DQ3D7B0FBOFX0DV2DGMB$YPF62I$60/F$Z2I6IFX21XNI-LM%3/DF/U6Z9FEOJVRLVW6K$UG+BKK57:1+D10%4K83F+1VWD1NE";
    let expected = Credential {
        name: Name {
            surname: "Di Caprio".to_string(),
            surname_transliterated: "DI<CAPRIO".to_string(),
            given_name: Some("Marilù Teresa".to_string()),
            given_name_transliterated: Some("MARILU<TERESA".to_string()),
        },
        date_of_birth: "1977-06-16".to_string(),
        vaccinations: vec![VaccinationEntry {
            certificate_id: "01ITE7300E1AB2A84C719004F103DCB1F70A#6".to_string(),
            country: "IT".to_string(),
            dose_number: Numeric::Int(2),
            date: "2021-04-10".to_string(),
            issuer: "IT".to_string(),
            marketing_auth_holder: "ORG-100030215".to_string(),
            medicinal_product: "EU/1/20/1528".to_string(),
            total_doses: Numeric::Int(2),
            disease_targeted: "840539006".to_string(),
            vaccine_type: "1119349007".to_string(),
        }],
        tests: None,
        recoveries: None,
        version: "1.0.0".to_string(),
    };

    assert!(looks_like_credential(vaccine_record_data));
    let decoded = decode(vaccine_record_data, &Config::default()).unwrap();
    assert_eq!(decoded.credential(), Some(&expected));
    assert_eq!(decoded.cose_tag, Some(cose::COSE_SIGN1_TAG));
    assert!(decoded.diagnose_lines.is_empty());
    assert!(!decoded.signature().unwrap().is_empty());
    assert!(decoded.protected_header.as_ref().unwrap().typed.is_some());
}
