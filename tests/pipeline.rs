mod common;

use std::path::Path;

use common::*;
use hc1dec::{
    decode, looks_like_credential, Config, DecodeError, Numeric, Stage, ValueSetMapper,
};
use serde_cbor::Value;

fn config() -> Config {
    Config::default()
}

#[test]
fn decodes_ireland_vaccination() {
    let decoded = decode(&ie_qr_text(), &config()).unwrap();

    assert!(decoded.is_complete());
    let claims = decoded.claims().unwrap();
    assert_eq!(claims.issuer, "IE");
    assert_eq!(claims.issued_at, 1_622_316_073);
    assert_eq!(claims.expiry, 1_643_356_073);

    let cert = decoded.credential().unwrap();
    assert_eq!(cert.name.full_name(), "Aoife Murphy");
    assert_eq!(cert.vaccinations.len(), 1);
    let vaccine = &cert.vaccinations[0];
    assert_eq!(vaccine.dose_number(), 1);
    assert_eq!(vaccine.total_doses(), 1);

    let mapper =
        ValueSetMapper::load(Path::new(env!("CARGO_MANIFEST_DIR")).join("valuesetdata")).unwrap();
    assert_eq!(
        mapper.medicinal_product(&vaccine.medicinal_product).unwrap().display,
        "Comirnaty"
    );

    let protected = decoded.protected_header.as_ref().unwrap();
    assert_eq!(protected.map.get(1), Some(&Value::Integer(-7)));
    assert_eq!(
        protected.typed.as_ref().unwrap().kid,
        Some(vec![0xd9, 0x19, 0x37, 0x5f, 0xc1, 0xe7, 0xb6, 0xb2])
    );
    assert!(decoded.unprotected_header().unwrap().is_empty());
    assert_eq!(decoded.signature().unwrap(), &[0x5a; 64][..]);
    assert!(decoded.degraded.is_empty());
    assert!(decoded.payload_value.is_some());
}

#[test]
fn missing_prefix_stops_at_envelope() {
    let text = ie_qr_text().replacen("HC1", "HC9", 1);
    assert!(!looks_like_credential(&text));

    let partial = decode(&text, &config()).unwrap_err();
    assert!(matches!(partial.error, DecodeError::BadEnvelope(_)));
    assert_eq!(partial.error.stage(), Stage::Envelope);
    assert_eq!(partial.output.raw_text, text);
    assert!(partial.output.base45_decoded.is_empty());
    assert!(partial.output.inflated.is_empty());
    assert_eq!(partial.output.separator, None);
}

#[test]
fn envelope_output_is_kept() {
    let text = format!("{}\n", ie_qr_text());
    let decoded = decode(&text, &config()).unwrap();
    assert_eq!(decoded.raw_text, text);
    assert_eq!(decoded.separator, Some(':'));
    assert_eq!(decoded.envelope_body, &text.trim_end()[4..]);
}

#[test]
fn bad_base45_stops_at_radix45() {
    let partial = decode("HC1:BB8a", &config()).unwrap_err();
    assert_eq!(partial.error.stage(), Stage::Radix45);
    assert_eq!(partial.output.envelope_body, "BB8a");
    assert!(partial.output.base45_decoded.is_empty());
}

#[test]
fn truncated_compression_keeps_earlier_stages() {
    let cose = sign1(&claims("IE", hcert_one(dcc(vec![]))));
    let mut compressed = deflate(&cose);
    compressed.pop();
    let text = envelope(&compressed);

    let partial = decode(&text, &config()).unwrap_err();
    assert!(matches!(partial.error, DecodeError::BadCompression(_)));
    assert_eq!(partial.output.raw_text, text);
    assert_eq!(partial.output.base45_decoded, compressed);
    assert!(partial.output.inflated.is_empty());
    assert_eq!(partial.output.cose_tag, None);
}

#[test]
fn inflated_size_limit() {
    let config = Config {
        max_inflated_len: Some(16),
        ..Config::default()
    };
    let partial = decode(&ie_qr_text(), &config).unwrap_err();
    assert!(matches!(partial.error, DecodeError::BadCompression(ref m) if m.contains("limit")));
}

#[test]
fn other_tag_is_reported() {
    // tag 17 is COSE_Mac0
    let payload = serde_cbor::to_vec(&claims("IE", hcert_one(dcc(vec![])))).unwrap();
    let cose = tagged(17, &sign1_array(protected_header(), payload));
    let partial = decode(&qr_text(&cose), &config()).unwrap_err();

    assert_eq!(
        partial.error,
        DecodeError::UnsupportedMessageType {
            got: 17,
            expected: 18
        }
    );
    assert_eq!(partial.output.cose_tag, Some(17));
    assert!(matches!(partial.output.tagged_message, Some(Value::Tag(17, _))));
    assert!(partial.output.signed.is_none());
    assert_eq!(partial.output.inflated, cose);
}

#[test]
fn wrong_array_shape() {
    let cose = tagged(
        18,
        &Value::Array(vec![Value::Bytes(vec![]), Value::Map(Default::default())]),
    );
    let partial = decode(&qr_text(&cose), &config()).unwrap_err();
    match &partial.error {
        DecodeError::MalformedSignedStructure { hex, .. } => assert_eq!(hex, &hex::encode(&cose)),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(partial.output.cose_tag, Some(18));
    assert!(partial.output.tagged_message.is_some());
}

#[test]
fn empty_protected_header_decodes() {
    let payload = claims("IE", hcert_one(dcc(vec![])));
    let cose = tagged(18, &sign1_array(vec![], serde_cbor::to_vec(&payload).unwrap()));
    let decoded = decode(&qr_text(&cose), &config()).unwrap();
    let protected = decoded.protected_header.as_ref().unwrap();
    assert!(protected.map.is_empty());
    assert!(decoded.credential().unwrap().vaccinations.is_empty());
}

#[test]
fn odd_protected_header_is_degraded_not_fatal() {
    // {1: -7, 4: "not bytes", 33: [1]}
    let protected = serde_cbor::to_vec(&map(vec![
        (Value::Integer(1), Value::Integer(-7)),
        (Value::Integer(4), text("not bytes")),
        (Value::Integer(33), Value::Array(vec![Value::Integer(1)])),
    ]))
    .unwrap();
    let payload = claims("IE", hcert_one(dcc(vec![])));
    let cose = tagged(18, &sign1_array(protected, serde_cbor::to_vec(&payload).unwrap()));

    let decoded = decode(&qr_text(&cose), &config()).unwrap();
    let header = decoded.protected_header.as_ref().unwrap();
    assert!(header.typed.is_none());
    assert_eq!(header.map.len(), 3);
    assert_eq!(decoded.degraded.len(), 1);
    assert_eq!(decoded.degraded[0].stage(), Stage::ProtectedHeader);
    assert!(!decoded.degraded[0].is_fatal());
    assert!(decoded.claims().is_some());
}

#[test]
fn protected_header_that_is_not_cbor_stops_the_decode() {
    let payload = claims("IE", hcert_one(dcc(vec![])));
    let cose = tagged(
        18,
        &sign1_array(vec![0xff, 0x00], serde_cbor::to_vec(&payload).unwrap()),
    );
    let partial = decode(&qr_text(&cose), &config()).unwrap_err();

    assert_eq!(partial.error.stage(), Stage::ProtectedHeader);
    match &partial.error {
        DecodeError::MalformedProtectedHeader { hex, .. } => assert_eq!(hex, "ff00"),
        other => panic!("unexpected {:?}", other),
    }
    let output = &partial.output;
    assert_eq!(output.signed.as_ref().unwrap().protected, vec![0xff, 0x00]);
    assert!(output.protected_header.is_none());
    assert!(output.payload_value.is_none());
    assert!(output.claims.is_none());
    assert!(!output.is_complete());
}

#[test]
fn null_vaccinations_and_credential_decode() {
    let mut credential = dcc(vec![]);
    if let Value::Map(m) = &mut credential {
        m.insert(text("v"), Value::Null);
    }
    let decoded = decode(&qr_text(&sign1(&claims("IE", hcert_one(credential)))), &config())
        .unwrap();
    assert!(decoded.credential().unwrap().vaccinations.is_empty());

    let decoded = decode(&qr_text(&sign1(&claims("IE", hcert_one(Value::Null)))), &config())
        .unwrap();
    assert!(decoded.is_complete());
    assert!(decoded.credential().is_none());
}

#[test]
fn float_doses_match_integer_doses() {
    let as_float = qr_text(&sign1(&claims(
        "IE",
        hcert_one(dcc(vec![ie_vaccination(Value::Float(1.0), Value::Float(2.0))])),
    )));
    let as_int = qr_text(&sign1(&claims(
        "IE",
        hcert_one(dcc(vec![ie_vaccination(Value::Integer(1), Value::Integer(2))])),
    )));

    let a = decode(&as_float, &config()).unwrap();
    let b = decode(&as_int, &config()).unwrap();
    let va = &a.credential().unwrap().vaccinations[0];
    let vb = &b.credential().unwrap().vaccinations[0];
    assert_eq!(va.dose_number, Numeric::Float(1.0));
    assert_eq!(vb.dose_number, Numeric::Int(1));
    assert_eq!(va.dose_number, vb.dose_number);
    assert_eq!(va.total_doses, vb.total_doses);
    assert_eq!(va.total_doses(), 2);
}

#[test]
fn missing_date_is_empty() {
    let mut vaccination = ie_vaccination(Value::Integer(1), Value::Integer(1));
    if let Value::Map(m) = &mut vaccination {
        m.remove(&text("dt"));
    }
    let text = qr_text(&sign1(&claims("IE", hcert_one(dcc(vec![vaccination])))));

    let decoded = decode(&text, &config()).unwrap();
    assert_eq!(decoded.credential().unwrap().vaccinations[0].date, "");
}

#[test]
fn bad_claims_keep_everything_and_diagnose() {
    let hcert = map(vec![(text("1"), dcc(vec![]))]);
    let cose = sign1(&claims("IE", hcert));
    let partial = decode(&qr_text(&cose), &config()).unwrap_err();

    assert_eq!(partial.error.stage(), Stage::Claims);
    assert!(partial.error.is_fatal());
    let output = &partial.output;
    assert_eq!(output.inflated, cose);
    assert_eq!(output.cose_tag, Some(18));
    assert!(output.signed.is_some());
    assert!(output.protected_header.is_some());
    assert!(output.payload_value.is_some());
    assert!(output.claims.is_none());
    assert!(output
        .diagnose_lines
        .iter()
        .any(|l| l == "ERROR hcert key expected=unsigned integer got=text key=\"1\""));

    match &partial.error {
        DecodeError::MalformedClaims { hex, .. } => {
            let payload = &output.signed.as_ref().unwrap().payload;
            assert_eq!(hex, &hex::encode(payload));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn payload_that_is_not_cbor() {
    let cose = tagged(18, &sign1_array(protected_header(), vec![0xff, 0xff]));
    let partial = decode(&qr_text(&cose), &config()).unwrap_err();
    assert_eq!(partial.error.stage(), Stage::Claims);
    assert!(partial.output.payload_value.is_none());
    assert!(partial.output.diagnose_lines[1].starts_with("ERROR payload is not valid CBOR"));
}

#[test]
fn partial_decode_is_an_error() {
    let partial = decode("nope", &config()).unwrap_err();
    let message = partial.to_string();
    assert!(message.starts_with("decoding stopped at envelope stage"), "{}", message);
    assert!(std::error::Error::source(&partial).is_some());
}
