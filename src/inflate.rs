use flate2::{Decompress, FlushDecompress, Status};

use crate::error::DecodeError;

const CHUNK: usize = 4096;

/// Inflates a zlib stream into a growable buffer.
///
/// The stream must run to its end marker and checksum: input that runs out
/// first is reported as truncated instead of returning what was produced so
/// far. `limit` caps the output size.
pub fn inflate(compressed: &[u8], limit: Option<usize>) -> Result<Vec<u8>, DecodeError> {
    let mut zlib = Decompress::new(true);
    let mut out = Vec::with_capacity(compressed.len().saturating_mul(2).max(CHUNK));

    loop {
        if let Some(limit) = limit {
            if out.len() > limit {
                return Err(DecodeError::BadCompression(format!(
                    "inflated output exceeds limit of {} bytes",
                    limit
                )));
            }
        }
        out.reserve(CHUNK);

        let in_before = zlib.total_in();
        let out_before = zlib.total_out();
        let consumed = in_before as usize;

        let status = zlib
            .decompress_vec(&compressed[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| DecodeError::BadCompression(format!("corrupt zlib stream: {}", e)))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                if zlib.total_in() == in_before && zlib.total_out() == out_before {
                    return Err(DecodeError::BadCompression(format!(
                        "truncated zlib stream after {} of {} bytes",
                        zlib.total_in(),
                        compressed.len()
                    )));
                }
            }
        }
    }

    if let Some(limit) = limit {
        if out.len() > limit {
            return Err(DecodeError::BadCompression(format!(
                "inflated output exceeds limit of {} bytes",
                limit
            )));
        }
    }

    Ok(out)
}
