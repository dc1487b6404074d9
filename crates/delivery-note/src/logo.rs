//! Company logo as a `data:` URL

use crate::{NoteError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pdf_core::{detect_format, ImageFormat};

/// Decode the image bytes of a base64 `data:` URL
pub fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| NoteError::Logo("not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| NoteError::Logo("data URL has no payload".to_string()))?;

    if !header.starts_with("image/") {
        return Err(NoteError::Logo(format!("unsupported media type '{header}'")));
    }
    if !header.ends_with(";base64") {
        return Err(NoteError::Logo("data URL is not base64 encoded".to_string()));
    }

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| NoteError::Logo(format!("invalid base64: {e}")))
}

/// Encode JPEG or PNG bytes as a `data:` URL
pub fn encode_data_url(bytes: &[u8]) -> Result<String> {
    let mime = match detect_format(bytes).map_err(|e| NoteError::Logo(e.to_string()))? {
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Png => "image/png",
    };
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_encode_decode() {
        let url = encode_data_url(&PNG_SIGNATURE).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_url(&url).unwrap(), PNG_SIGNATURE.to_vec());
    }

    #[test]
    fn test_decode_rejects() {
        assert!(matches!(decode_data_url("http://x/logo.png"), Err(NoteError::Logo(_))));
        assert!(matches!(decode_data_url("data:image/png;base64"), Err(NoteError::Logo(_))));
        assert!(matches!(decode_data_url("data:text/plain;base64,AAAA"), Err(NoteError::Logo(_))));
        assert!(matches!(decode_data_url("data:image/png,raw"), Err(NoteError::Logo(_))));
        assert!(matches!(decode_data_url("data:image/png;base64,@@@"), Err(NoteError::Logo(_))));
    }

    #[test]
    fn test_encode_rejects_unknown_format() {
        assert!(encode_data_url(b"GIF89a\0\0\0").is_err());
    }
}
