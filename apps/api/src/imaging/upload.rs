//! Upload validation: image MIME types only, bounded size, data-URL decoding.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;

use super::ImageError;

/// Largest accepted upload, before normalization.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// A raw, validated image upload. Not yet decoded.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub mime_type: String,
    pub bytes: Bytes,
}

impl ImageUpload {
    pub fn new(
        mime_type: impl Into<String>,
        bytes: Bytes,
        max_bytes: usize,
    ) -> Result<Self, ImageError> {
        let mime_type = mime_type.into();
        ensure_image_mime(&mime_type)?;
        ensure_within_limit(bytes.len(), max_bytes)?;
        Ok(Self { mime_type, bytes })
    }

    /// Parses `data:image/<subtype>;base64,<payload>`.
    pub fn from_data_url(url: &str, max_bytes: usize) -> Result<Self, ImageError> {
        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| ImageError::InvalidDataUrl("missing 'data:' prefix".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ImageError::InvalidDataUrl("missing ',' separator".to_string()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| ImageError::InvalidDataUrl("payload must be base64".to_string()))?;
        ensure_image_mime(mime_type)?;

        // Reject oversized payloads before paying for the decode
        let payload = payload.trim();
        ensure_within_limit(decoded_len(payload), max_bytes)?;

        let bytes = BASE64.decode(payload)?;
        Self::new(mime_type, Bytes::from(bytes), max_bytes)
    }
}

/// Byte length a padded base64 payload decodes to.
fn decoded_len(payload: &str) -> usize {
    let padding = payload.bytes().rev().take(2).take_while(|&b| b == b'=').count();
    (payload.len() / 4 * 3).saturating_sub(padding)
}

fn ensure_image_mime(mime_type: &str) -> Result<(), ImageError> {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.strip_prefix("image/") {
        Some(subtype) if !subtype.is_empty() => Ok(()),
        _ => Err(ImageError::UnsupportedMediaType(mime_type.to_string())),
    }
}

fn ensure_within_limit(size: usize, limit: usize) -> Result<(), ImageError> {
    if size > limit {
        Err(ImageError::TooLarge { size, limit })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_image_types() {
        for mime in ["image/jpeg", "image/png", "IMAGE/WEBP", "image/heic; q=1"] {
            assert!(ImageUpload::new(mime, Bytes::from_static(b"x"), 10).is_ok(), "{mime}");
        }
    }

    #[test]
    fn rejects_non_image_types() {
        for mime in ["application/pdf", "text/plain", "", "image/"] {
            let err = ImageUpload::new(mime, Bytes::from_static(b"x"), 10).unwrap_err();
            assert!(matches!(err, ImageError::UnsupportedMediaType(_)), "{mime}");
        }
    }

    #[test]
    fn enforces_size_limit() {
        let at_limit = Bytes::from(vec![0u8; MAX_UPLOAD_BYTES]);
        assert!(ImageUpload::new("image/jpeg", at_limit, MAX_UPLOAD_BYTES).is_ok());

        let over = Bytes::from(vec![0u8; MAX_UPLOAD_BYTES + 1]);
        let err = ImageUpload::new("image/jpeg", over, MAX_UPLOAD_BYTES).unwrap_err();
        assert!(matches!(
            err,
            ImageError::TooLarge {
                size,
                limit: MAX_UPLOAD_BYTES
            } if size == MAX_UPLOAD_BYTES + 1
        ));
    }

    #[test]
    fn parses_base64_data_url() {
        let url = format!("data:image/png;base64,{}", BASE64.encode(b"\x89PNGdata"));
        let upload = ImageUpload::from_data_url(&url, 1024).unwrap();
        assert_eq!(upload.mime_type, "image/png");
        assert_eq!(&upload.bytes[..], b"\x89PNGdata");
    }

    #[test]
    fn rejects_malformed_data_urls() {
        for url in [
            "image/png;base64,AAAA",
            "data:image/png;base64",
            "data:image/png,plain-text",
        ] {
            let err = ImageUpload::from_data_url(url, 1024).unwrap_err();
            assert!(matches!(err, ImageError::InvalidDataUrl(_)), "{url}");
        }
    }

    #[test]
    fn rejects_non_image_data_url() {
        let url = format!("data:text/html;base64,{}", BASE64.encode(b"<p>"));
        let err = ImageUpload::from_data_url(&url, 1024).unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedMediaType(_)));
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = ImageUpload::from_data_url("data:image/png;base64,@@@@", 1024).unwrap_err();
        assert!(matches!(err, ImageError::Base64(_)));
    }

    #[test]
    fn decoded_len_accounts_for_padding() {
        for size in [0usize, 1, 2, 3, 4, 5, 299, 300] {
            let encoded = BASE64.encode(vec![1u8; size]);
            assert_eq!(decoded_len(&encoded), size, "{size}");
        }
    }

    #[test]
    fn data_url_size_limit_matches_raw_upload() {
        // Covers every padding length
        for limit in [MAX_UPLOAD_BYTES, 999, 1000, 1001] {
            let exact = format!("data:image/jpeg;base64,{}", BASE64.encode(vec![7u8; limit]));
            let upload = ImageUpload::from_data_url(&exact, limit).unwrap();
            assert_eq!(upload.bytes.len(), limit);

            let under = format!(
                "data:image/jpeg;base64,{}",
                BASE64.encode(vec![7u8; limit - 1])
            );
            assert!(ImageUpload::from_data_url(&under, limit).is_ok(), "{limit}");

            let over = format!(
                "data:image/jpeg;base64,{}",
                BASE64.encode(vec![7u8; limit + 1])
            );
            let err = ImageUpload::from_data_url(&over, limit).unwrap_err();
            assert!(
                matches!(err, ImageError::TooLarge { size, .. } if size == limit + 1),
                "{limit}: {err}"
            );
        }
    }

    #[test]
    fn rejects_oversized_data_url_before_decoding() {
        let url = format!("data:image/jpeg;base64,{}", BASE64.encode(vec![7u8; 3000]));
        let err = ImageUpload::from_data_url(&url, 1000).unwrap_err();
        assert!(matches!(err, ImageError::TooLarge { .. }));
    }
}
