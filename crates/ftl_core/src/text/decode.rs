use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, WINDOWS_1252};
use serde::Serialize;

use crate::error::{Error, Result};

const BOM_UTF8: &[u8] = &[0xEF, 0xBB, 0xBF];
const BOM_UTF16LE: &[u8] = &[0xFF, 0xFE];
const BOM_UTF16BE: &[u8] = &[0xFE, 0xFF];

// Byte values windows-1252 leaves unassigned; seeing one means the text is not cp1252.
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Windows1252,
}

impl TextEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf16Be => "UTF-16BE",
            Self::Windows1252 => "windows-1252",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineEnding {
    CrLf,
    Lf,
    Cr,
    None,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrLf => "\r\n",
            Self::Lf => "\n",
            Self::Cr => "\r",
            Self::None => "",
        }
    }
}

/// Resource text with line endings normalized to `\n`, plus what it looked like on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
    pub line_ending: LineEnding,
    pub bom: Vec<u8>,
}

impl DecodedText {
    /// Re-applies the original line endings, for tools that write text back out.
    pub fn with_original_line_endings(&self) -> String {
        match self.line_ending {
            LineEnding::Lf | LineEnding::None => self.text.clone(),
            other => self.text.replace('\n', other.as_str()),
        }
    }
}

pub fn decode(bytes: &[u8]) -> Result<DecodedText> {
    let (encoding, bom) = if bytes.starts_with(BOM_UTF8) {
        (Some(TextEncoding::Utf8), BOM_UTF8)
    } else if bytes.starts_with(BOM_UTF16LE) {
        (Some(TextEncoding::Utf16Le), BOM_UTF16LE)
    } else if bytes.starts_with(BOM_UTF16BE) {
        (Some(TextEncoding::Utf16Be), BOM_UTF16BE)
    } else {
        (None, &[][..])
    };
    let body = &bytes[bom.len()..];

    let (raw, encoding) = match encoding {
        Some(TextEncoding::Utf8) => (strict_utf8(body).map_err(bom_failure)?, TextEncoding::Utf8),
        Some(TextEncoding::Utf16Le) => (
            strict(UTF_16LE, body).map_err(bom_failure)?,
            TextEncoding::Utf16Le,
        ),
        Some(TextEncoding::Utf16Be) => (
            strict(UTF_16BE, body).map_err(bom_failure)?,
            TextEncoding::Utf16Be,
        ),
        Some(TextEncoding::Windows1252) | None => sniff(body)?,
    };

    let line_ending = detect_line_ending(&raw);
    Ok(DecodedText {
        text: normalize_line_endings(raw),
        encoding,
        line_ending,
        bom: bom.to_vec(),
    })
}

fn sniff(body: &[u8]) -> Result<(String, TextEncoding)> {
    let utf8_err = match strict_utf8(body) {
        Ok(text) => return Ok((text, TextEncoding::Utf8)),
        Err(e) => e,
    };
    match strict_cp1252(body) {
        Ok(text) => {
            log::debug!("text is not UTF-8 ({utf8_err}), decoded as windows-1252");
            Ok((text, TextEncoding::Windows1252))
        }
        Err(fallback) => Err(Error::EncodingDetection {
            utf8: utf8_err,
            fallback,
        }),
    }
}

fn strict_utf8(body: &[u8]) -> std::result::Result<String, String> {
    std::str::from_utf8(body)
        .map(str::to_owned)
        .map_err(|e| e.to_string())
}

fn strict(encoding: &'static Encoding, body: &[u8]) -> std::result::Result<String, String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
        .ok_or_else(|| format!("malformed {} sequence", encoding.name()))
}

fn strict_cp1252(body: &[u8]) -> std::result::Result<String, String> {
    if let Some(at) = body.iter().position(|b| CP1252_UNDEFINED.contains(b)) {
        return Err(format!("undefined byte 0x{:02X} at offset {at}", body[at]));
    }
    strict(WINDOWS_1252, body)
}

fn bom_failure(reason: String) -> Error {
    Error::EncodingDetection {
        utf8: reason,
        fallback: "not attempted, byte-order mark present".to_string(),
    }
}

fn detect_line_ending(text: &str) -> LineEnding {
    let bytes = text.as_bytes();
    match bytes.iter().position(|&b| b == b'\r' || b == b'\n') {
        Some(at) if bytes[at] == b'\n' => LineEnding::Lf,
        Some(at) if bytes.get(at + 1) == Some(&b'\n') => LineEnding::CrLf,
        Some(_) => LineEnding::Cr,
        None => LineEnding::None,
    }
}

fn normalize_line_endings(text: String) -> String {
    if !text.contains('\r') {
        return text;
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::{LineEnding, TextEncoding, decode};
    use crate::error::Error;

    #[test]
    fn utf8_bom_is_reported_and_stripped() {
        let decoded = decode(b"\xEF\xBB\xBF<a/>\r\n<b/>\r\n").expect("decodes");
        assert_eq!(decoded.encoding, TextEncoding::Utf8);
        assert_eq!(decoded.bom, vec![0xEF, 0xBB, 0xBF]);
        assert_eq!(decoded.line_ending, LineEnding::CrLf);
        assert_eq!(decoded.text, "<a/>\n<b/>\n");
        assert_eq!(decoded.with_original_line_endings(), "<a/>\r\n<b/>\r\n");
    }

    #[test]
    fn utf16_boms_select_the_matching_decoder() {
        let mut le = vec![0xFF, 0xFE];
        for unit in "hi\n".encode_utf16() {
            le.extend_from_slice(&unit.to_le_bytes());
        }
        let decoded = decode(&le).expect("utf-16le decodes");
        assert_eq!(decoded.encoding, TextEncoding::Utf16Le);
        assert_eq!(decoded.text, "hi\n");

        let mut be = vec![0xFE, 0xFF];
        for unit in "ok".encode_utf16() {
            be.extend_from_slice(&unit.to_be_bytes());
        }
        let decoded = decode(&be).expect("utf-16be decodes");
        assert_eq!(decoded.encoding, TextEncoding::Utf16Be);
        assert_eq!(decoded.text, "ok");
        assert_eq!(decoded.line_ending, LineEnding::None);
    }

    #[test]
    fn invalid_utf8_falls_back_to_windows_1252() {
        let decoded = decode(b"caf\xE9\rnext").expect("decodes");
        assert_eq!(decoded.encoding, TextEncoding::Windows1252);
        assert_eq!(decoded.text, "caf\u{E9}\nnext");
        assert_eq!(decoded.line_ending, LineEnding::Cr);
        assert!(decoded.bom.is_empty());
    }

    #[test]
    fn both_candidates_failing_reports_both_reasons() {
        match decode(b"\xE9\x81") {
            Err(Error::EncodingDetection { utf8, fallback }) => {
                assert!(!utf8.is_empty());
                assert!(fallback.contains("0x81"));
            }
            other => panic!("expected encoding detection failure, got {other:?}"),
        }
    }

    #[test]
    fn first_line_break_decides_the_style() {
        assert_eq!(decode(b"a\nb\r\n").expect("decodes").line_ending, LineEnding::Lf);
        assert_eq!(decode(b"a\r\nb\n").expect("decodes").text, "a\nb\n");
    }
}
