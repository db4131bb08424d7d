use crate::version::{GameVersion, VersionRange};

/// A narrow, line-oriented repair for one known malformation in a vendor file.
///
/// Every kind is a no-op on text it has already repaired, so the table can be run
/// any number of times and in any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    /// Removes the first line if, trimmed, it equals `text`.
    DropLeadingLine { text: &'static str },
    /// Keeps only the first `attribute` inside each `<element ...>` start tag.
    StripDuplicateAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    /// On a line that opens `<opened>` and closes it with `</wrong>`, fixes the close.
    RenameClosingTag {
        opened: &'static str,
        wrong: &'static str,
    },
    /// Closes an `<element>` left open when the next one starts (or at end of file).
    CloseUnterminatedElement { element: &'static str },
}

#[derive(Debug, Clone, Copy)]
pub struct TextPatch {
    pub file: &'static str,
    pub versions: VersionRange,
    pub kind: PatchKind,
}

pub const BUILTIN_PATCHES: &[TextPatch] = &[
    TextPatch {
        file: "achievements.xml",
        versions: VersionRange::ANY,
        kind: PatchKind::DropLeadingLine {
            text: "<!-- Achievements",
        },
    },
    TextPatch {
        file: "blueprints.xml",
        versions: VersionRange::until(GameVersion::new(1, 3, 3)),
        kind: PatchKind::StripDuplicateAttribute {
            element: "crewCount",
            attribute: "amount",
        },
    },
    TextPatch {
        file: "blueprints.xml",
        versions: VersionRange::ANY,
        kind: PatchKind::RenameClosingTag {
            opened: "desc",
            wrong: "description",
        },
    },
    TextPatch {
        file: "autoBlueprints.xml",
        versions: VersionRange::ANY,
        kind: PatchKind::CloseUnterminatedElement {
            element: "shipBlueprint",
        },
    },
];

pub fn patches_for(file: &str, version: GameVersion) -> impl Iterator<Item = &'static TextPatch> {
    let file = file.to_string();
    BUILTIN_PATCHES
        .iter()
        .filter(move |patch| patch.file == file && patch.versions.contains(version))
}

/// Runs every built-in patch registered for `file` at `version`.
pub fn apply_patches(file: &str, version: GameVersion, text: &str) -> String {
    let mut out = text.to_string();
    for patch in patches_for(file, version) {
        let patched = patch.kind.apply(&out);
        if patched != out {
            log::debug!("{file}: applied {:?}", patch.kind);
            out = patched;
        }
    }
    out
}

impl PatchKind {
    pub fn apply(&self, text: &str) -> String {
        match *self {
            Self::DropLeadingLine { text: bogus } => drop_leading_line(text, bogus),
            Self::StripDuplicateAttribute { element, attribute } => {
                map_lines(text, |line| strip_duplicate_attribute(line, element, attribute))
            }
            Self::RenameClosingTag { opened, wrong } => {
                map_lines(text, |line| rename_closing_tag(line, opened, wrong))
            }
            Self::CloseUnterminatedElement { element } => close_unterminated(text, element),
        }
    }
}

fn map_lines(text: &str, mut f: impl FnMut(&str) -> String) -> String {
    text.split('\n').map(&mut f).collect::<Vec<_>>().join("\n")
}

fn drop_leading_line(text: &str, bogus: &str) -> String {
    match text.split_once('\n') {
        Some((first, rest)) if first.trim() == bogus => rest.to_string(),
        None if text.trim() == bogus => String::new(),
        _ => text.to_string(),
    }
}

/// Byte offset of each `<name` start tag on the line (not `</name`, not `<nameSuffix`).
fn start_tags(line: &str, name: &str) -> Vec<usize> {
    let needle = format!("<{name}");
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(rel) = line[from..].find(&needle) {
        let at = from + rel;
        let after = line[at + needle.len()..].chars().next();
        if after.is_none_or(|c| c.is_whitespace() || c == '>' || c == '/') {
            found.push(at);
        }
        from = at + needle.len();
    }
    found
}

fn strip_duplicate_attribute(line: &str, element: &str, attribute: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut copied = 0;
    for tag_start in start_tags(line, element) {
        if tag_start < copied {
            continue;
        }
        let tag_end = line[tag_start..]
            .find('>')
            .map_or(line.len(), |rel| tag_start + rel);
        let spans = attribute_spans(&line[tag_start..tag_end], attribute);
        for (start, end) in spans.into_iter().skip(1) {
            out.push_str(&line[copied..tag_start + start]);
            copied = tag_start + end;
        }
    }
    out.push_str(&line[copied..]);
    out
}

/// Spans of ` attribute="value"` (leading whitespace included) inside one start tag.
fn attribute_spans(tag: &str, attribute: &str) -> Vec<(usize, usize)> {
    let bytes = tag.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let ws_start = i;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
            i += 1;
        }
        let name = &tag[name_start..i];
        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= bytes.len() || bytes[j] != b'=' {
            continue;
        }
        j += 1;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= bytes.len() || (bytes[j] != b'"' && bytes[j] != b'\'') {
            i = j;
            continue;
        }
        let quote = bytes[j];
        let Some(close) = tag[j + 1..].find(quote as char) else {
            break;
        };
        let end = j + 1 + close + 1;
        if name == attribute {
            spans.push((ws_start, end));
        }
        i = end;
    }
    spans
}

fn rename_closing_tag(line: &str, opened: &str, wrong: &str) -> String {
    let Some(&open_at) = start_tags(line, opened).first() else {
        return line.to_string();
    };
    let right_close = format!("</{opened}>");
    let wrong_close = format!("</{wrong}>");
    if line[open_at..].contains(&right_close) {
        return line.to_string();
    }
    match line[open_at..].find(&wrong_close) {
        Some(rel) => {
            let at = open_at + rel;
            format!(
                "{}{}{}",
                &line[..at],
                right_close,
                &line[at + wrong_close.len()..]
            )
        }
        None => line.to_string(),
    }
}

fn close_unterminated(text: &str, element: &str) -> String {
    let close = format!("</{element}>");
    let mut depth = 0usize;
    let mut lines = Vec::new();
    for line in text.split('\n') {
        let mut events: Vec<(usize, bool)> = start_tags(line, element)
            .into_iter()
            .filter(|&at| !is_self_closing(line, at))
            .map(|at| (at, true))
            .collect();
        events.extend(line.match_indices(&close).map(|(at, _)| (at, false)));
        events.sort_unstable();

        let mut patched = String::with_capacity(line.len());
        let mut copied = 0;
        for (at, opens) in events {
            if opens {
                if depth > 0 {
                    patched.push_str(&line[copied..at]);
                    patched.push_str(&close);
                    copied = at;
                } else {
                    depth += 1;
                }
            } else {
                depth = depth.saturating_sub(1);
            }
        }
        patched.push_str(&line[copied..]);
        lines.push(patched);
    }

    if depth > 0
        && let Some(last) = lines.iter_mut().rev().find(|line| !line.trim().is_empty())
    {
        last.push_str(&close);
    }
    lines.join("\n")
}

fn is_self_closing(line: &str, tag_start: usize) -> bool {
    line[tag_start..]
        .find('>')
        .is_some_and(|rel| line[tag_start..tag_start + rel].ends_with('/'))
}

#[cfg(test)]
mod tests {
    use super::{BUILTIN_PATCHES, PatchKind, apply_patches, patches_for};
    use crate::version::GameVersion;

    #[test]
    fn drops_only_the_known_leading_line() {
        let kind = PatchKind::DropLeadingLine {
            text: "<!-- Achievements",
        };
        assert_eq!(
            kind.apply("<!-- Achievements\n<achievement id=\"A\"/>"),
            "<achievement id=\"A\"/>"
        );
        let clean = "<achievement id=\"A\"/>\n<!-- Achievements";
        assert_eq!(kind.apply(clean), clean);
    }

    #[test]
    fn strips_second_copy_of_attribute() {
        let kind = PatchKind::StripDuplicateAttribute {
            element: "crewCount",
            attribute: "amount",
        };
        assert_eq!(
            kind.apply("  <crewCount amount=\"3\" class=\"human\" amount=\"3\"/>"),
            "  <crewCount amount=\"3\" class=\"human\"/>"
        );
        let other = "<crewCountMax amount=\"1\" amount=\"2\"/>";
        assert_eq!(kind.apply(other), other);
    }

    #[test]
    fn renames_mismatched_close_on_same_line() {
        let kind = PatchKind::RenameClosingTag {
            opened: "desc",
            wrong: "description",
        };
        assert_eq!(
            kind.apply("<desc>A sturdy ship.</description>"),
            "<desc>A sturdy ship.</desc>"
        );
        let ok = "<description>fine</description>";
        assert_eq!(kind.apply(ok), ok);
    }

    #[test]
    fn closes_element_before_next_sibling_and_at_end() {
        let kind = PatchKind::CloseUnterminatedElement {
            element: "shipBlueprint",
        };
        let text = "<shipBlueprint name=\"A\">\n\t<class>x</class>\n<shipBlueprint name=\"B\">\n\t<class>y</class>\n";
        let patched = kind.apply(text);
        assert_eq!(
            patched,
            "<shipBlueprint name=\"A\">\n\t<class>x</class>\n</shipBlueprint><shipBlueprint name=\"B\">\n\t<class>y</class></shipBlueprint>\n"
        );
        assert_eq!(patched.lines().count(), text.lines().count());
    }

    #[test]
    fn self_closing_elements_do_not_count_as_open() {
        let kind = PatchKind::CloseUnterminatedElement {
            element: "shipBlueprint",
        };
        let text = "<shipBlueprint name=\"A\"/>\n<shipBlueprint name=\"B\"></shipBlueprint>";
        assert_eq!(kind.apply(text), text);
    }

    #[test]
    fn patch_table_is_idempotent() {
        let samples = [
            ("achievements.xml", "<!-- Achievements\n<achievement id=\"X\"/>\n"),
            (
                "blueprints.xml",
                "<shipBlueprint>\n<crewCount amount=\"2\" amount=\"2\"/>\n<desc>d</description>\n</shipBlueprint>\n",
            ),
            (
                "autoBlueprints.xml",
                "<shipBlueprint name=\"A\">\n<shipBlueprint name=\"B\">\n",
            ),
        ];
        let version = GameVersion::new(1, 3, 3);
        for (file, text) in samples {
            let once = apply_patches(file, version, text);
            assert_ne!(once, text, "{file} should need patching");
            let twice = apply_patches(file, version, &once);
            assert_eq!(once, twice, "{file} patches must not double-apply");
        }
    }

    #[test]
    fn version_range_limits_applicable_patches() {
        assert_eq!(patches_for("blueprints.xml", GameVersion::new(1, 3, 3)).count(), 2);
        assert_eq!(patches_for("blueprints.xml", GameVersion::new(1, 5, 4)).count(), 1);
        assert_eq!(patches_for("unknown.xml", GameVersion::new(1, 3, 3)).count(), 0);
        assert!(BUILTIN_PATCHES.iter().all(|p| !p.file.is_empty()));
    }
}
