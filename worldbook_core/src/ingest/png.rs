//! Image metadata extractor - recovers a character card embedded in PNG text chunks.
//!
//! The container is a fixed 8-byte signature followed by chunks of
//! `length (u32 BE) | type (4 ASCII bytes) | payload | crc (4 bytes)`.
//! Cards live base64-encoded in `tEXt` or `iTXt` chunks under a known keyword.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde_json::Value;
use tracing::{debug, warn};

use worldbook_model::ImportConfig;

use super::cursor::ByteCursor;
use crate::error::ParseError;

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

const CHUNK_END: &[u8; 4] = b"IEND";
const CHUNK_TEXT: &[u8; 4] = b"tEXt";
const CHUNK_INTL_TEXT: &[u8; 4] = b"iTXt";

/// Keyword whose payload wins over any other recognized keyword.
const PREFERRED_KEYWORD: &str = "ccv3";

/// Standard alphabet, padding optional.
const CARD_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Extracts embedded card JSON from PNG bytes.
#[derive(Debug, Clone)]
pub struct ImageMetadataExtractor {
    keywords: Vec<String>,
}

impl ImageMetadataExtractor {
    /// Create an extractor that acts only on the given chunk keywords.
    pub fn new(keywords: Vec<String>) -> Self {
        Self { keywords }
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(config.card_keywords.clone())
    }

    /// Recover the embedded card, or `None` if the bytes are not a PNG or carry no card.
    pub fn extract(&self, bytes: &[u8]) -> Option<Value> {
        if !bytes.starts_with(&PNG_SIGNATURE) {
            debug!(len = bytes.len(), "not a PNG container");
            return None;
        }

        let mut found = None;
        if let Err(err) = self.scan(bytes, &mut found) {
            debug!(%err, "PNG chunk stream truncated; keeping what was found");
        }
        found.map(|(_, card)| card)
    }

    fn scan(&self, bytes: &[u8], found: &mut Option<(String, Value)>) -> Result<(), ParseError> {
        let mut cursor = ByteCursor::new(bytes);
        cursor.skip(PNG_SIGNATURE.len())?;

        while !cursor.is_empty() {
            let length = cursor.read_u32_be()? as usize;
            let kind = cursor.take_array::<4>()?;
            if &kind == CHUNK_END {
                break;
            }

            let payload = cursor.take(length)?;
            cursor.skip(4)?;

            let Some((keyword, text)) = split_text_chunk(&kind, payload) else {
                continue;
            };
            if !self.keywords.iter().any(|k| k == keyword) {
                debug!(keyword, "skipping unrecognized text chunk");
                continue;
            }

            match decode_card(text) {
                Some(card) => {
                    let preferred = keyword == PREFERRED_KEYWORD;
                    if found.is_none() || preferred {
                        *found = Some((keyword.to_string(), card));
                    }
                    if preferred {
                        break;
                    }
                }
                None => warn!(keyword, "text chunk did not hold a readable card"),
            }
        }

        Ok(())
    }
}

impl Default for ImageMetadataExtractor {
    fn default() -> Self {
        Self::from_config(&ImportConfig::default())
    }
}

/// Split a text chunk into its keyword and text bytes.
///
/// `iTXt` carries compression flag, method, language tag and translated keyword
/// before the text, so its text is the last NUL-separated segment.
fn split_text_chunk<'a>(kind: &[u8; 4], payload: &'a [u8]) -> Option<(&'a str, &'a [u8])> {
    if kind != CHUNK_TEXT && kind != CHUNK_INTL_TEXT {
        return None;
    }

    let nul = payload.iter().position(|b| *b == 0)?;
    let keyword = std::str::from_utf8(&payload[..nul]).ok()?;
    let remainder = &payload[nul + 1..];

    let text = if kind == CHUNK_INTL_TEXT {
        remainder.split(|b| *b == 0).last()?
    } else {
        remainder
    };
    Some((keyword, text))
}

/// Decode base64 to bytes, then those bytes as UTF-8 JSON; fall back to the raw text as JSON.
fn decode_card(text: &[u8]) -> Option<Value> {
    let raw = String::from_utf8_lossy(text);
    let raw = raw.trim();

    let decoded = CARD_BASE64
        .decode(raw)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|json| serde_json::from_str::<Value>(&json).ok())
        .filter(Value::is_object);

    decoded.or_else(|| serde_json::from_str::<Value>(raw).ok().filter(Value::is_object))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
    use serde_json::json;

    /// Append one chunk with a zeroed checksum.
    pub(crate) fn push_chunk(out: &mut Vec<u8>, kind: &[u8; 4], payload: &[u8]) {
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(kind);
        out.extend_from_slice(payload);
        out.extend_from_slice(&[0, 0, 0, 0]);
    }

    pub(crate) fn text_payload(keyword: &str, text: &str) -> Vec<u8> {
        let mut payload = keyword.as_bytes().to_vec();
        payload.push(0);
        payload.extend_from_slice(text.as_bytes());
        payload
    }

    /// A minimal PNG carrying `card` base64-encoded under `keyword`.
    pub(crate) fn png_with_card(keyword: &str, card: &Value) -> Vec<u8> {
        let mut png = PNG_SIGNATURE.to_vec();
        push_chunk(&mut png, b"IHDR", &[0u8; 13]);
        let encoded = STANDARD.encode(card.to_string());
        push_chunk(&mut png, b"tEXt", &text_payload(keyword, &encoded));
        push_chunk(&mut png, b"IEND", &[]);
        png
    }

    #[test]
    fn test_extracts_base64_card() {
        let card = json!({"name": "Mira", "data": {"name": "Mira"}});
        let png = png_with_card("chara", &card);

        assert_eq!(ImageMetadataExtractor::default().extract(&png), Some(card));
    }

    #[test]
    fn test_multibyte_text_survives_decoding() {
        let card = json!({"name": "小红", "description": "温柔细心"});
        let png = png_with_card("chara", &card);

        let extracted = ImageMetadataExtractor::default().extract(&png).unwrap();
        assert_eq!(extracted["name"], "小红");
        assert_eq!(extracted["description"], "温柔细心");
    }

    #[test]
    fn test_wrong_signature_returns_none() {
        let mut png = png_with_card("chara", &json!({"name": "x"}));
        png[1] = b'X';
        assert!(ImageMetadataExtractor::default().extract(&png).is_none());
        assert!(ImageMetadataExtractor::default().extract(b"short").is_none());
    }

    #[test]
    fn test_unrecognized_keyword_is_skipped() {
        let png = png_with_card("Comment", &json!({"name": "x"}));
        assert!(ImageMetadataExtractor::default().extract(&png).is_none());
    }

    #[test]
    fn test_unpadded_base64_is_accepted() {
        let card = json!({"name": "Pad"});
        let raw = card.to_string();
        assert_ne!(raw.len() % 3, 0);
        let encoded = STANDARD_NO_PAD.encode(&raw);
        assert!(!encoded.ends_with('='));

        let mut png = PNG_SIGNATURE.to_vec();
        push_chunk(&mut png, b"tEXt", &text_payload("chara", &encoded));
        push_chunk(&mut png, b"IEND", &[]);

        assert_eq!(ImageMetadataExtractor::default().extract(&png), Some(card));
    }

    #[test]
    fn test_raw_json_fallback() {
        let mut png = PNG_SIGNATURE.to_vec();
        push_chunk(&mut png, b"tEXt", &text_payload("chara", r#"{"name":"Raw"}"#));
        push_chunk(&mut png, b"IEND", &[]);

        let card = ImageMetadataExtractor::default().extract(&png).unwrap();
        assert_eq!(card["name"], "Raw");
    }

    #[test]
    fn test_itxt_text_is_last_segment() {
        let encoded = STANDARD.encode(json!({"name": "Intl"}).to_string());
        let mut payload = b"chara\0".to_vec();
        payload.extend_from_slice(&[0, 0]);
        payload.extend_from_slice(b"en\0");
        payload.extend_from_slice(b"chara\0");
        payload.extend_from_slice(encoded.as_bytes());

        let mut png = PNG_SIGNATURE.to_vec();
        push_chunk(&mut png, b"iTXt", &payload);
        push_chunk(&mut png, b"IEND", &[]);

        let card = ImageMetadataExtractor::default().extract(&png).unwrap();
        assert_eq!(card["name"], "Intl");
    }

    #[test]
    fn test_bad_chunk_does_not_abort_scan() {
        let mut png = PNG_SIGNATURE.to_vec();
        push_chunk(&mut png, b"tEXt", &text_payload("chara", "%%% not a card %%%"));
        let encoded = STANDARD.encode(json!({"name": "Second"}).to_string());
        push_chunk(&mut png, b"tEXt", &text_payload("character", &encoded));
        push_chunk(&mut png, b"IEND", &[]);

        let card = ImageMetadataExtractor::default().extract(&png).unwrap();
        assert_eq!(card["name"], "Second");
    }

    #[test]
    fn test_ccv3_preferred_over_chara() {
        let mut png = PNG_SIGNATURE.to_vec();
        let v2 = STANDARD.encode(json!({"spec": "v2"}).to_string());
        let v3 = STANDARD.encode(json!({"spec": "v3"}).to_string());
        push_chunk(&mut png, b"tEXt", &text_payload("chara", &v2));
        push_chunk(&mut png, b"tEXt", &text_payload("ccv3", &v3));
        push_chunk(&mut png, b"IEND", &[]);

        let card = ImageMetadataExtractor::default().extract(&png).unwrap();
        assert_eq!(card["spec"], "v3");
    }

    #[test]
    fn test_chunks_after_end_are_ignored() {
        let mut png = PNG_SIGNATURE.to_vec();
        push_chunk(&mut png, b"IEND", &[]);
        let encoded = STANDARD.encode(json!({"name": "Late"}).to_string());
        push_chunk(&mut png, b"tEXt", &text_payload("chara", &encoded));

        assert!(ImageMetadataExtractor::default().extract(&png).is_none());
    }

    #[test]
    fn test_truncated_stream_returns_none() {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend_from_slice(&1000u32.to_be_bytes());
        png.extend_from_slice(b"tEXt");
        png.extend_from_slice(b"chara\0abc");

        assert!(ImageMetadataExtractor::default().extract(&png).is_none());
    }

    #[test]
    fn test_truncation_keeps_earlier_card() {
        let mut png = png_with_card("chara", &json!({"name": "Kept"}));
        png.truncate(png.len() - 12);
        png.extend_from_slice(&500u32.to_be_bytes());
        png.extend_from_slice(b"tEXt");

        let card = ImageMetadataExtractor::default().extract(&png).unwrap();
        assert_eq!(card["name"], "Kept");
    }
}
