#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_cbor::Value;

pub const ISS: i128 = 1;
pub const EXP: i128 = 4;
pub const IAT: i128 = 6;
pub const HCERT: i128 = -260;

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

pub fn map(entries: Vec<(Value, Value)>) -> Value {
    Value::Map(entries.into_iter().collect::<BTreeMap<_, _>>())
}

/// A vaccination entry like the ones the Irish HSE issues.
pub fn ie_vaccination(dn: Value, sd: Value) -> Value {
    map(vec![
        (text("tg"), text("840539006")),
        (text("vp"), text("1119349007")),
        (text("mp"), text("EU/1/20/1528")),
        (text("ma"), text("ORG-100030215")),
        (text("dn"), dn),
        (text("sd"), sd),
        (text("dt"), text("2021-05-18")),
        (text("co"), text("IE")),
        (text("is"), text("HSE")),
        (text("ci"), text("URN:UVCI:01:IE:8A4C1E27DD7C4D2F8B3AB7D0D8E9F2C1#D")),
    ])
}

pub fn dcc(vaccinations: Vec<Value>) -> Value {
    map(vec![
        (text("ver"), text("1.3.0")),
        (text("dob"), text("1965-04-11")),
        (
            text("nam"),
            map(vec![
                (text("fn"), text("Murphy")),
                (text("fnt"), text("MURPHY")),
                (text("gn"), text("Aoife")),
                (text("gnt"), text("AOIFE")),
            ]),
        ),
        (text("v"), Value::Array(vaccinations)),
    ])
}

pub fn claims(issuer: &str, hcert: Value) -> Value {
    map(vec![
        (Value::Integer(ISS), text(issuer)),
        (Value::Integer(IAT), Value::Integer(1_622_316_073)),
        (Value::Integer(EXP), Value::Integer(1_643_356_073)),
        (Value::Integer(HCERT), hcert),
    ])
}

pub fn hcert_one(dcc: Value) -> Value {
    map(vec![(Value::Integer(1), dcc)])
}

/// {1: -7, 4: h'd919375fc1e7b6b2'}
pub fn protected_header() -> Vec<u8> {
    serde_cbor::to_vec(&map(vec![
        (Value::Integer(1), Value::Integer(-7)),
        (
            Value::Integer(4),
            Value::Bytes(vec![0xd9, 0x19, 0x37, 0x5f, 0xc1, 0xe7, 0xb6, 0xb2]),
        ),
    ]))
    .unwrap()
}

pub fn sign1_array(protected: Vec<u8>, payload: Vec<u8>) -> Value {
    Value::Array(vec![
        Value::Bytes(protected),
        Value::Map(BTreeMap::new()),
        Value::Bytes(payload),
        Value::Bytes(vec![0x5a; 64]),
    ])
}

/// CBOR encodes `content` behind a one byte tag header (tags below 24).
pub fn tagged(tag: u8, content: &Value) -> Vec<u8> {
    assert!(tag < 24);
    let mut out = vec![0xc0 | tag];
    out.extend(serde_cbor::to_vec(content).unwrap());
    out
}

pub fn sign1(payload: &Value) -> Vec<u8> {
    tagged(
        18,
        &sign1_array(protected_header(), serde_cbor::to_vec(payload).unwrap()),
    )
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn envelope(compressed: &[u8]) -> String {
    format!("HC1:{}", base45::encode(compressed))
}

/// The full QR text for a COSE message.
pub fn qr_text(cose: &[u8]) -> String {
    envelope(&deflate(cose))
}

pub fn ie_qr_text() -> String {
    qr_text(&sign1(&claims(
        "IE",
        hcert_one(dcc(vec![ie_vaccination(
            Value::Integer(1),
            Value::Integer(1),
        )])),
    )))
}
