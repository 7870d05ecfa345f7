//! Tolerant HTML fragment parser and serializer
//!
//! Good enough for documentation pages: elements, attributes, comments,
//! doctype, void elements, raw text in `script`/`style` and the common
//! character references. Malformed markup never fails; stray closing tags are
//! dropped and unclosed elements are closed at the end of input.

use crate::dom::{Document, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Element never has children or a closing tag
#[must_use]
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Element content is not markup
#[must_use]
pub fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Escape a value so it renders as text anywhere in markup, attributes included
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Decode character references; unknown ones are kept as written
#[must_use]
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode_entity(rest) {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(input: &str) -> Option<(char, usize)> {
    let end = input.find(';')?;
    if end > 10 {
        return None;
    }
    let c = match &input[1..end] {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        reference => {
            let number = reference.strip_prefix('#')?;
            let code = match number.strip_prefix(|c: char| c == 'x' || c == 'X') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)?
        }
    };
    Some((c, end + 1))
}

struct StartTag {
    tag: String,
    attributes: Vec<(String, String)>,
    self_closing: bool,
    len: usize,
}

/// Parse a start tag at the beginning of `input`, `None` if it is unterminated
fn parse_start_tag(input: &str) -> Option<StartTag> {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 1;
    while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' && bytes[i] != b'/' {
        i += 1;
    }
    let tag = input[1..i].to_ascii_lowercase();
    let mut attributes: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= len {
            return None;
        }
        match bytes[i] {
            b'>' => {
                return Some(StartTag {
                    tag,
                    attributes,
                    self_closing,
                    len: i + 1,
                })
            }
            b'/' => {
                self_closing = true;
                i += 1;
            }
            _ => {
                self_closing = false;
                let start = i;
                while i < len
                    && !bytes[i].is_ascii_whitespace()
                    && !matches!(bytes[i], b'=' | b'>' | b'/')
                {
                    i += 1;
                }
                let name = input[start..i].to_ascii_lowercase();
                while i < len && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                let mut value = String::new();
                if i < len && bytes[i] == b'=' {
                    i += 1;
                    while i < len && bytes[i].is_ascii_whitespace() {
                        i += 1;
                    }
                    if i < len && (bytes[i] == b'"' || bytes[i] == b'\'') {
                        let quote = bytes[i];
                        i += 1;
                        let start = i;
                        while i < len && bytes[i] != quote {
                            i += 1;
                        }
                        if i >= len {
                            return None;
                        }
                        value = decode_entities(&input[start..i]);
                        i += 1;
                    } else {
                        let start = i;
                        while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                            i += 1;
                        }
                        value = decode_entities(&input[start..i]);
                    }
                }
                if !name.is_empty() && !attributes.iter().any(|(n, _)| *n == name) {
                    attributes.push((name, value));
                }
            }
        }
    }
}

fn append_text(doc: &mut Document, parent: NodeId, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(&last) = doc.children(parent).last() {
        if let Some(existing) = doc.text(last) {
            let merged = format!("{existing}{text}");
            doc.set_text(last, merged);
            return;
        }
    }
    let node = doc.create_text(text);
    doc.append_child(parent, node);
}

/// Parse `markup` and append the resulting nodes to `parent`
pub(crate) fn parse_into(doc: &mut Document, parent: NodeId, markup: &str) {
    let mut stack = vec![parent];
    let mut pos = 0;

    while pos < markup.len() {
        let rest = &markup[pos..];
        let current = stack.last().copied().unwrap_or(parent);

        if let Some(body) = rest.strip_prefix("<!--") {
            let end = body.find("-->").unwrap_or(body.len());
            let comment = doc.create_comment(&body[..end]);
            doc.append_child(current, comment);
            pos += 4 + (end + 3).min(body.len());
            continue;
        }

        if let Some(body) = rest.strip_prefix("<!") {
            let end = body.find('>').unwrap_or(body.len());
            let inner = body[..end].trim();
            let is_doctype = inner
                .get(..7)
                .is_some_and(|keyword| keyword.eq_ignore_ascii_case("doctype"));
            let node = match inner.get(7..) {
                Some(declaration) if is_doctype => doc.create_doctype(declaration.trim()),
                _ => doc.create_comment(inner),
            };
            doc.append_child(current, node);
            pos += 2 + (end + 1).min(body.len());
            continue;
        }

        if let Some(body) = rest.strip_prefix("</") {
            if let Some(end) = body.find('>') {
                let name = body[..end].trim().to_ascii_lowercase();
                if let Some(depth) = stack
                    .iter()
                    .rposition(|&id| id != parent && doc.tag(id) == Some(name.as_str()))
                {
                    stack.truncate(depth);
                }
                pos += 2 + end + 1;
                continue;
            }
        }

        if rest.len() > 1 && rest.as_bytes()[0] == b'<' && rest.as_bytes()[1].is_ascii_alphabetic() {
            if let Some(start) = parse_start_tag(rest) {
                let element = doc.create_element(&start.tag, start.attributes);
                doc.append_child(current, element);
                pos += start.len;

                if is_raw_text_element(&start.tag) && !start.self_closing {
                    let body = &markup[pos..];
                    let close = format!("</{}", start.tag);
                    let end = body.to_ascii_lowercase().find(&close).unwrap_or(body.len());
                    if end > 0 {
                        let text = doc.create_text(&body[..end]);
                        doc.append_child(element, text);
                    }
                    pos += end;
                    stack.push(element);
                } else if !start.self_closing && !is_void_element(&start.tag) {
                    stack.push(element);
                }
                continue;
            }
        }

        // plain text up to the next tag; a lone '<' is text too
        let skip = usize::from(rest.starts_with('<'));
        let end = rest[skip..].find('<').map_or(rest.len(), |i| i + skip);
        append_text(doc, current, &decode_entities(&rest[..end]));
        pos += end;
    }
}

/// Serialize the children of `id`
pub(crate) fn serialize_children(doc: &Document, id: NodeId, out: &mut String) {
    let raw = doc.tag(id).is_some_and(is_raw_text_element);
    for &child in doc.children(id) {
        match doc.data(child) {
            NodeData::Text(text) if raw => out.push_str(text),
            _ => serialize_node(doc, child, out),
        }
    }
}

/// Serialize `id` and its subtree
pub(crate) fn serialize_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.data(id) {
        NodeData::Root => serialize_children(doc, id, out),
        NodeData::Doctype(text) => {
            out.push_str("<!DOCTYPE");
            if !text.is_empty() {
                out.push(' ');
                out.push_str(text);
            }
            out.push('>');
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Text(text) => out.push_str(&escape_text(text)),
        NodeData::Element { tag, attributes } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_attribute(value));
                out.push('"');
            }
            out.push('>');
            if is_void_element(tag) {
                return;
            }
            serialize_children(doc, id, out);
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}
