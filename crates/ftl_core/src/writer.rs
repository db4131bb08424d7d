use encoding_rs::WINDOWS_1252;

use crate::error::{Error, Result};
use crate::mystery::MysteryRange;

#[derive(Debug, Default)]
pub struct LittleEndianWriter {
    out: Vec<u8>,
}

impl LittleEndianWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            out: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }

    pub fn write_i32(&mut self, value: i32) {
        self.out.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.out.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_i32(i32::from(value));
    }

    pub fn write_count(&mut self, field: &str, count: usize) -> Result<()> {
        let raw = i32::try_from(count).map_err(|_| Error::mismatch(field, i32::MAX as usize, count))?;
        self.write_i32(raw);
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    pub fn write_string(&mut self, field: &str, text: &str) -> Result<()> {
        let (bytes, _, had_errors) = WINDOWS_1252.encode(text);
        if had_errors {
            return Err(Error::UnencodableString {
                field: field.to_string(),
                text: text.to_string(),
            });
        }
        self.write_count(field, bytes.len())?;
        self.write_bytes(&bytes);
        Ok(())
    }

    pub fn write_mystery(&mut self, range: &MysteryRange) {
        self.write_bytes(range.bytes());
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::LittleEndianWriter;
    use crate::error::Error;
    use crate::reader::LittleEndianReader;

    #[test]
    fn strings_are_length_prefixed() {
        let mut w = LittleEndianWriter::new();
        w.write_string("name", "Kestrel").expect("ascii encodes");
        let bytes = w.into_bytes();
        assert_eq!(&bytes[..4], &7i32.to_le_bytes());
        assert_eq!(&bytes[4..], b"Kestrel");
    }

    #[test]
    fn every_byte_value_survives_a_string_round_trip() {
        let raw: Vec<u8> = (0..=255u8).collect();
        let mut input = (raw.len() as i32).to_le_bytes().to_vec();
        input.extend_from_slice(&raw);

        let mut r = LittleEndianReader::new(Cursor::new(input.clone())).expect("reader");
        let text = r.read_string().expect("decode");

        let mut w = LittleEndianWriter::new();
        w.write_string("all bytes", &text).expect("encode");
        assert_eq!(w.into_bytes(), input);
    }

    #[test]
    fn characters_outside_the_code_page_are_rejected() {
        let mut w = LittleEndianWriter::new();
        let err = w.write_string("crew name", "\u{65E5}").unwrap_err();
        assert!(matches!(err, Error::UnencodableString { .. }));
        assert!(w.is_empty());
    }
}
