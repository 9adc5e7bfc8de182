use crate::error::DecodeError;

/// RFC 9285 alphabet, index is the digit value.
const ALPHABET: &[u8; 45] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Decodes base45 text into raw bytes.
///
/// The heavy lifting is done by the `base45` crate; the checks in front of it
/// only exist to point at the offending character, which the crate does not
/// report.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    if let Some((offset, c)) = text
        .char_indices()
        .find(|(_, c)| !c.is_ascii() || !ALPHABET.contains(&(*c as u8)))
    {
        return Err(DecodeError::BadEncoding(format!(
            "invalid character {:?} at offset {}",
            c, offset
        )));
    }

    if text.len() % 3 == 1 {
        return Err(DecodeError::BadEncoding(format!(
            "dangling final group of 1 character (length {})",
            text.len()
        )));
    }

    base45::decode(text).map_err(|e| {
        DecodeError::BadEncoding(format!("{} (length {})", e, text.len()))
    })
}
