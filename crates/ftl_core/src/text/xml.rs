use crate::error::{Error, Result};
use crate::version::GameVersion;

use super::patch::apply_patches;

pub const SYNTHETIC_ROOT: &str = "ftl-root";

/// Vendor XML after patching, ready for a strict parser.
///
/// `document` has the same line numbering as `patched`, so a parser position maps
/// straight back to the line a maintainer has to look at.
#[derive(Debug, Clone)]
pub struct PreparedXml {
    pub file: String,
    pub version: GameVersion,
    pub patched: String,
    pub document: String,
}

pub fn prepare_xml(file: &str, version: GameVersion, text: &str) -> PreparedXml {
    let patched = apply_patches(file, version, text);
    let body = strip_declaration(&strip_comments(&patched));
    let document = format!("<{SYNTHETIC_ROOT}>{body}\n</{SYNTHETIC_ROOT}>");
    PreparedXml {
        file: file.to_string(),
        version,
        patched,
        document,
    }
}

impl PreparedXml {
    pub fn parse(&self) -> Result<roxmltree::Document<'_>> {
        roxmltree::Document::parse(&self.document).map_err(|e| {
            let line = e.pos().row;
            Error::XmlPatchFailure {
                file: self.file.clone(),
                version: self.version,
                line,
                text: self.patched_line(line),
                message: e.to_string(),
            }
        })
    }

    /// Text of a 1-based line of the patched source; empty past the end.
    pub fn patched_line(&self, line: u32) -> String {
        let index = (line as usize).saturating_sub(1);
        self.patched
            .split('\n')
            .nth(index)
            .unwrap_or_default()
            .to_string()
    }
}

/// Replaces every `<!-- ... -->` with the newlines it contained. An unterminated
/// comment runs to end of input.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("<!--") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 4..];
        let (comment, tail) = match after_open.find("-->") {
            Some(end) => (&after_open[..end], &after_open[end + 3..]),
            None => (after_open, ""),
        };
        out.extend(comment.chars().filter(|&c| c == '\n'));
        rest = tail;
    }
    out.push_str(rest);
    out
}

/// Removes a leading `<?xml ...?>` declaration, keeping its line breaks.
pub fn strip_declaration(text: &str) -> String {
    let trimmed = text.trim_start_matches([' ', '\t', '\n', '\u{feff}']);
    let skipped = &text[..text.len() - trimmed.len()];
    if !trimmed.starts_with("<?xml") {
        return text.to_string();
    }
    let Some(end) = trimmed.find("?>") else {
        return text.to_string();
    };
    let mut out: String = skipped.chars().filter(|&c| c == '\n').collect();
    out.extend(trimmed[..end].chars().filter(|&c| c == '\n'));
    out.push_str(&trimmed[end + 2..]);
    out
}
