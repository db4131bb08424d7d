use roxmltree::Node;

use crate::error::{Error, Result};

pub(crate) fn format_error(file: &str, node: Node<'_, '_>, message: String) -> Error {
    let pos = node.document().text_pos_at(node.range().start);
    Error::SchemaFormat {
        file: file.to_string(),
        message: format!("line {}: {message}", pos.row),
    }
}

pub(crate) fn required_attr<'a>(file: &str, node: Node<'a, '_>, name: &str) -> Result<&'a str> {
    node.attribute(name).ok_or_else(|| {
        format_error(
            file,
            node,
            format!("<{}> is missing attribute {name:?}", node.tag_name().name()),
        )
    })
}

pub(crate) fn int_attr(file: &str, node: Node<'_, '_>, name: &str) -> Result<i32> {
    let raw = required_attr(file, node, name)?;
    parse_int(file, node, name, raw)
}

pub(crate) fn opt_int_attr(file: &str, node: Node<'_, '_>, name: &str) -> Result<Option<i32>> {
    node.attribute(name)
        .map(|raw| parse_int(file, node, name, raw))
        .transpose()
}

pub(crate) fn bool_attr(node: Node<'_, '_>, name: &str) -> bool {
    node.attribute(name)
        .is_some_and(|raw| raw.trim().eq_ignore_ascii_case("true"))
}

pub(crate) fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| n.has_tag_name(name))
}

pub(crate) fn required_child<'a, 'i>(
    file: &str,
    node: Node<'a, 'i>,
    name: &str,
) -> Result<Node<'a, 'i>> {
    child(node, name).ok_or_else(|| format_error(file, node, format!("missing <{name}>")))
}

/// Trimmed text of a child element, `None` if absent or empty.
pub(crate) fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    let text = child(node, name)?.text()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

pub(crate) fn child_int(file: &str, node: Node<'_, '_>, name: &str) -> Result<Option<i32>> {
    let Some(element) = child(node, name) else {
        return Ok(None);
    };
    let raw = element.text().unwrap_or_default();
    parse_int(file, element, name, raw).map(Some)
}

fn parse_int(file: &str, node: Node<'_, '_>, name: &str, raw: &str) -> Result<i32> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| format_error(file, node, format!("{name}={raw:?} is not an integer")))
}
