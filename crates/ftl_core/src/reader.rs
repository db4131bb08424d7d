use std::io::{self, Read, Seek, SeekFrom};

use encoding_rs::WINDOWS_1252;

use crate::error::{Error, Result};
use crate::mystery::MysteryRange;

pub struct LittleEndianReader<R> {
    inner: R,
    pos: u64,
    len: u64,
}

impl<R: Read + Seek> LittleEndianReader<R> {
    pub fn new(mut inner: R) -> Result<Self> {
        let pos = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(pos))?;
        Ok(Self { inner, pos, len })
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array::<4>()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array::<4>()?))
    }

    /// Reads an int-encoded flag; only 0 and 1 are accepted.
    pub fn read_bool(&mut self) -> Result<bool> {
        let offset = self.pos;
        match self.read_i32()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(Error::InvalidBool { offset, value }),
        }
    }

    /// Reads a 4-byte count/length prefix, rejecting negative values.
    pub fn read_count(&mut self) -> Result<usize> {
        let offset = self.pos;
        let raw = self.read_i32()?;
        usize::try_from(raw).map_err(|_| Error::InvalidLength {
            offset,
            length: raw,
        })
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure(N as u64)?;
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.ensure(n as u64)?;
        let mut buf = vec![0u8; n];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Length-prefixed string; bytes are taken verbatim in the windows-1252 code page.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_count()?;
        let bytes = self.read_bytes(len)?;
        let (text, _) = WINDOWS_1252.decode_without_bom_handling(&bytes);
        Ok(text.into_owned())
    }

    pub fn read_mystery(&mut self, n: usize) -> Result<MysteryRange> {
        let offset = self.pos;
        let bytes = self.read_bytes(n)?;
        Ok(MysteryRange::new(offset, bytes))
    }

    /// Captures everything from the current position to the end of the stream.
    pub fn read_rest(&mut self) -> Result<MysteryRange> {
        let remaining = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        self.read_mystery(remaining)
    }

    /// Capacity hint for a list of `count` records of at least `min_record` bytes each.
    pub fn capacity_hint(&self, count: usize, min_record: usize) -> usize {
        let fits = self.remaining() / min_record.max(1) as u64;
        count.min(usize::try_from(fits).unwrap_or(usize::MAX))
    }

    fn ensure(&self, needed: u64) -> Result<()> {
        let available = self.remaining();
        if needed > available {
            return Err(Error::Truncated {
                offset: self.pos,
                needed,
                available,
            });
        }
        Ok(())
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Error::Truncated {
                    offset: self.pos,
                    needed: buf.len() as u64,
                    available: self.remaining(),
                }
            } else {
                Error::from(e)
            }
        })?;
        self.pos += buf.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::LittleEndianReader;
    use crate::error::Error;

    #[test]
    fn reads_little_endian_ints() {
        let bytes = [0x04, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut r = LittleEndianReader::new(Cursor::new(&bytes[..])).expect("reader");
        assert_eq!(r.read_i32().expect("first"), 4);
        assert_eq!(r.read_i32().expect("second"), -1);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn string_shorter_than_prefix_is_truncation() {
        let mut bytes = 10i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"abc");
        let mut r = LittleEndianReader::new(Cursor::new(bytes)).expect("reader");
        match r.read_string() {
            Err(Error::Truncated {
                offset,
                needed,
                available,
            }) => {
                assert_eq!(offset, 4);
                assert_eq!(needed, 10);
                assert_eq!(available, 3);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
    }

    #[test]
    fn negative_count_is_rejected() {
        let bytes = (-2i32).to_le_bytes();
        let mut r = LittleEndianReader::new(Cursor::new(&bytes[..])).expect("reader");
        assert!(matches!(
            r.read_count(),
            Err(Error::InvalidLength { offset: 0, length: -2 })
        ));
    }

    #[test]
    fn flags_other_than_zero_or_one_are_rejected() {
        let mut bytes = 1i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&2i32.to_le_bytes());
        let mut r = LittleEndianReader::new(Cursor::new(bytes)).expect("reader");
        assert!(r.read_bool().expect("one is a flag"));
        assert!(matches!(
            r.read_bool(),
            Err(Error::InvalidBool { offset: 4, value: 2 })
        ));
    }

    #[test]
    fn high_bytes_decode_as_windows_1252() {
        let mut bytes = 3i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0x80, b'x', 0xE9]);
        let mut r = LittleEndianReader::new(Cursor::new(bytes)).expect("reader");
        assert_eq!(r.read_string().expect("string"), "\u{20AC}x\u{E9}");
    }

    #[test]
    fn rest_captures_trailing_bytes_with_offset() {
        let bytes = [1u8, 0, 0, 0, 9, 8, 7];
        let mut r = LittleEndianReader::new(Cursor::new(&bytes[..])).expect("reader");
        r.read_i32().expect("int");
        let rest = r.read_rest().expect("rest");
        assert_eq!(rest.offset(), 4);
        assert_eq!(rest.bytes(), &[9, 8, 7]);
        assert!(r.read_rest().expect("empty rest").is_empty());
    }
}
