//! Feed payload decoding: gzip or plain XML, as chains publish either.

use std::io::Read;

use flate2::read::MultiGzDecoder;

use crate::error::AcquisitionError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZIP_MAGIC: [u8; 4] = [b'P', b'K', 0x03, 0x04];

/// Decodes a downloaded feed into text.
///
/// Gzip is detected by its magic bytes rather than the file extension, since
/// several portals serve `.gz` names with plain bodies and vice versa. Invalid
/// UTF-8 sequences are replaced rather than rejected.
///
/// # Errors
///
/// Returns [`AcquisitionError::Decompress`] for corrupt gzip streams, zip
/// archives and empty payloads.
pub fn decode_payload(bytes: &[u8]) -> Result<String, AcquisitionError> {
    if bytes.is_empty() {
        return Err(AcquisitionError::Decompress {
            reason: "payload is empty".to_owned(),
        });
    }

    if bytes.starts_with(&ZIP_MAGIC) {
        return Err(AcquisitionError::Decompress {
            reason: "zip archives are not supported".to_owned(),
        });
    }

    let raw = if bytes.starts_with(&GZIP_MAGIC) {
        let mut out = Vec::with_capacity(bytes.len() * 8);
        MultiGzDecoder::new(bytes)
            .read_to_end(&mut out)
            .map_err(|e| AcquisitionError::Decompress {
                reason: format!("gzip: {e}"),
            })?;
        out
    } else {
        bytes.to_vec()
    };

    let text = String::from_utf8(raw)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
    Ok(text.trim_start_matches('\u{feff}').to_owned())
}
