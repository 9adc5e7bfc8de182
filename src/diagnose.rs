//! Diagnostics for payloads the typed claims decoder rejected.
//!
//! Different issuers kept turning up with different CBOR types for the same
//! field, so when the typed mapping fails the payload is decoded again as a
//! plain value tree and every key, value and type is written out, to see
//! what the issuer actually sent.

use std::fmt::Write;

use serde_cbor::Value;

use crate::claims::{DCC, EXP_CLAIM_KEY, HCERT_CLAIM_KEY, IAT_CLAIM_KEY, ISS_CLAIM_KEY};
use crate::header::kind_of;

/// Deeper levels are elided.
pub const MAX_DEPTH: usize = 64;

const INDENT: &str = "  ";
const MAX_TEXT: usize = 64;
const MAX_BYTES: usize = 32;

const TEXT: &[&str] = &["text"];
const NUMBER: &[&str] = &["unsigned integer", "negative integer", "float"];
const MAP: &[&str] = &["map"];
const ARRAY: &[&str] = &["array"];

/// Types the DCC schema expects for its fields.
fn expected_kinds(field: &str) -> Option<&'static [&'static str]> {
    match field {
        "ver" | "dob" | "fn" | "fnt" | "gn" | "gnt" | "tg" | "vp" | "mp" | "ma" | "dt"
        | "co" | "is" | "ci" => Some(TEXT),
        "dn" | "sd" => Some(NUMBER),
        "nam" => Some(MAP),
        "v" | "t" | "r" => Some(ARRAY),
        _ => None,
    }
}

/// The claims as far as they can be read without assuming anything about
/// the shape of the `hcert` claim.
struct ResilientClaims<'a> {
    iss: Option<&'a Value>,
    exp: Option<&'a Value>,
    iat: Option<&'a Value>,
    hcert: Option<&'a Value>,
}

/// Decodes `payload` into a value tree and describes it. Never fails; a
/// payload that is not even CBOR gets a line saying so.
pub fn diagnose_claims(payload: &[u8], cause: &str) -> Vec<String> {
    match serde_cbor::from_slice::<Value>(payload) {
        Ok(value) => diagnose_value(&value, cause),
        Err(e) => vec![
            format!("ERROR cbor unmarshalling claims, diagnosing: {}", cause),
            format!("ERROR payload is not valid CBOR err={}", e),
        ],
    }
}

/// Same as [`diagnose_claims`] for an already decoded payload.
pub fn diagnose_value(payload: &Value, cause: &str) -> Vec<String> {
    let mut lines = vec![format!(
        "ERROR cbor unmarshalling claims, diagnosing: {}",
        cause
    )];

    let claims = match payload {
        Value::Map(m) => ResilientClaims {
            iss: m.get(&Value::Integer(ISS_CLAIM_KEY)),
            exp: m.get(&Value::Integer(EXP_CLAIM_KEY)),
            iat: m.get(&Value::Integer(IAT_CLAIM_KEY)),
            hcert: m.get(&Value::Integer(HCERT_CLAIM_KEY)),
        },
        other => {
            lines.push(format!("ERROR payload expected map got={}", kind_of(other)));
            walk(other, 1, &mut lines);
            return lines;
        }
    };

    scalar_claim("iss", claims.iss, TEXT, &mut lines);
    scalar_claim("iat", claims.iat, &["unsigned integer"], &mut lines);
    scalar_claim("exp", claims.exp, &["unsigned integer"], &mut lines);

    match claims.hcert {
        None => lines.push(format!("ERROR hcert claim {} missing", HCERT_CLAIM_KEY)),
        Some(Value::Map(hcert)) => {
            for (key, value) in hcert {
                match key {
                    Value::Integer(k) if *k >= 0 => {
                        lines.push(format!("hcert key={} {}", k, describe(value)));
                        if *k != i128::from(DCC) {
                            lines.push(format!(
                                "WARN hcert key={} is reserved, only {} is defined",
                                k, DCC
                            ));
                        }
                        walk(value, 1, &mut lines);
                    }
                    other => lines.push(format!(
                        "ERROR hcert key expected=unsigned integer got={} key={}",
                        kind_of(other),
                        summary(other)
                    )),
                }
            }
        }
        Some(other) => {
            lines.push(format!("ERROR hcert expected map got={}", kind_of(other)));
            walk(other, 1, &mut lines);
        }
    }

    lines
}

fn scalar_claim(name: &str, value: Option<&Value>, expected: &[&str], lines: &mut Vec<String>) {
    match value {
        None => lines.push(format!("{} missing", name)),
        Some(v) if expected.contains(&kind_of(v)) => {
            lines.push(format!("{}={}", name, describe(v)))
        }
        Some(v) => lines.push(format!(
            "ERROR {} expected={} got={} value={}",
            name,
            expected.join(" or "),
            kind_of(v),
            summary(v)
        )),
    }
}

fn walk(value: &Value, depth: usize, lines: &mut Vec<String>) {
    let indent = INDENT.repeat(depth);

    if depth > MAX_DEPTH {
        lines.push(format!("{}... nested deeper than {} levels", indent, MAX_DEPTH));
        return;
    }

    match value {
        Value::Map(m) => {
            for (key, v) in m {
                lines.push(format!("{}key={} v={}", indent, describe(key), describe(v)));
                if let Value::Text(field) = key {
                    if let Some(expected) = expected_kinds(field) {
                        if !expected.contains(&kind_of(v)) {
                            lines.push(format!(
                                "{}ERROR {} expected={} got={}",
                                indent,
                                field,
                                expected.join(" or "),
                                kind_of(v)
                            ));
                        }
                    }
                }
                if is_container(v) {
                    walk(v, depth + 1, lines);
                }
            }
        }
        Value::Array(a) => {
            for (i, entry) in a.iter().enumerate() {
                lines.push(format!("{}[{}] {}", indent, i, describe(entry)));
                if is_container(entry) {
                    walk(entry, depth + 1, lines);
                }
            }
        }
        Value::Tag(_, content) => walk(content, depth + 1, lines),
        _ => {}
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Map(_) | Value::Array(_) | Value::Tag(_, _))
}

/// `summary (kind)`
fn describe(value: &Value) -> String {
    format!("{} ({})", summary(value), kind_of(value))
}

fn summary(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Text(s) if s.chars().count() > MAX_TEXT => {
            let head: String = s.chars().take(MAX_TEXT).collect();
            format!("{:?}...", head)
        }
        Value::Text(s) => format!("{:?}", s),
        Value::Bytes(b) => {
            let mut out = format!("h'{}'", hex::encode(&b[..b.len().min(MAX_BYTES)]));
            if b.len() > MAX_BYTES {
                let _ = write!(out, "... {} bytes", b.len());
            }
            out
        }
        Value::Array(a) => format!("array[{}]", a.len()),
        Value::Map(m) => format!("map[{}]", m.len()),
        Value::Tag(tag, _) => format!("tag {}", tag),
        _ => "?".to_string(),
    }
}
