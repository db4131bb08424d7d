//! Resource text decoding and repair of known-malformed vendor XML.

mod decode;
mod patch;
mod xml;

pub use decode::{DecodedText, LineEnding, TextEncoding, decode};
pub use patch::{BUILTIN_PATCHES, PatchKind, TextPatch, apply_patches, patches_for};
pub use xml::{PreparedXml, SYNTHETIC_ROOT, prepare_xml, strip_comments, strip_declaration};
