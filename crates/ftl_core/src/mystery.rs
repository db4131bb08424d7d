use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Raw bytes at a known position whose meaning is not understood.
///
/// The codec never interprets or edits these; they are written back exactly where
/// they were read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MysteryRange {
    offset: u64,
    #[serde(serialize_with = "to_hex", deserialize_with = "from_hex")]
    bytes: Vec<u8>,
}

impl MysteryRange {
    pub fn new(offset: u64, bytes: Vec<u8>) -> Self {
        Self { offset, bytes }
    }

    /// Offset in the source stream this range was captured from.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// First little-endian int in the range, if it is at least four bytes long.
    pub fn leading_i32(&self) -> Option<i32> {
        let head = self.bytes.get(..4)?;
        Some(i32::from_le_bytes([head[0], head[1], head[2], head[3]]))
    }
}

fn to_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

fn from_hex<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let text = String::deserialize(deserializer)?;
    hex::decode(text).map_err(serde::de::Error::custom)
}
