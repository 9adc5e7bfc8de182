use crate::error::DecodeError;

/// Every health certificate QR code starts with this.
pub const HC1_PREFIX: &str = "HC1";

/// Prefix plus the one character version separator, e.g. `HC1:`.
const HEADER_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<'a> {
    /// The character right after the prefix, normally `:`.
    pub separator: char,
    /// Base45 text following the header.
    pub body: &'a str,
}

/// Cheap prefix check, never fails on short or garbled input.
pub fn looks_like_credential(text: &str) -> bool {
    text.as_bytes().starts_with(HC1_PREFIX.as_bytes())
}

/// Checks the prefix and strips the 4 byte header. Trailing whitespace (a
/// newline from stdin, usually) is ignored.
pub fn parse(text: &str) -> Result<Envelope<'_>, DecodeError> {
    let text = text.trim_end();

    if !looks_like_credential(text) {
        let got: String = text.chars().take(HC1_PREFIX.len()).collect();
        return Err(DecodeError::BadEnvelope(format!(
            "data must start with {} prefix got={:?}",
            HC1_PREFIX, got
        )));
    }

    let separator = text[HC1_PREFIX.len()..].chars().next().ok_or_else(|| {
        DecodeError::BadEnvelope(format!("nothing after the {} prefix", HC1_PREFIX))
    })?;
    if separator.len_utf8() != 1 {
        return Err(DecodeError::BadEnvelope(format!(
            "version separator must be a single byte got={:?}",
            separator
        )));
    }

    Ok(Envelope {
        separator,
        body: &text[HEADER_LEN..],
    })
}
