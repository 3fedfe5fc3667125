//! `markup`：轻量 HTML 片段解析与序列化。
//!
//! 只覆盖可编辑区会出现的子集：元素、属性、文本、实体、注释（丢弃）。
//! 未闭合的标签在片段末尾自动闭合，多余的闭合标签忽略。

use mention_core::model::NodeId;

use crate::node::{Document, NodeKind};

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "wbr"];

pub fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// 把标记解析成游离的顶层节点（尚未挂到树上）。
pub fn parse_fragment(doc: &mut Document, markup: &str) -> Vec<NodeId> {
    let mut top = Vec::new();
    let mut open: Vec<NodeId> = Vec::new();
    let mut text = String::new();
    let mut rest = markup;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            text.push_str(rest);
            break;
        };
        text.push_str(&rest[..lt]);
        rest = &rest[lt..];

        let next = rest[1..].chars().next();
        match next {
            Some('!') => {
                flush_text(doc, &mut text, &open, &mut top);
                let end = if rest.starts_with("<!--") {
                    rest.find("-->").map(|i| i + 3)
                } else {
                    rest.find('>').map(|i| i + 1)
                };
                rest = &rest[end.unwrap_or(rest.len())..];
            }
            Some('/') => {
                flush_text(doc, &mut text, &open, &mut top);
                let end = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
                let name = rest[2..end.saturating_sub(1).max(2)].trim().to_ascii_lowercase();
                if let Some(pos) = open.iter().rposition(|&n| doc.tag(n) == Some(name.as_str())) {
                    open.truncate(pos);
                }
                rest = &rest[end..];
            }
            Some(c) if c.is_ascii_alphabetic() => {
                flush_text(doc, &mut text, &open, &mut top);
                let (tag, attrs, self_closing, consumed) = parse_open_tag(rest);
                let el = doc.create_element(&tag, attrs);
                attach(doc, el, &open, &mut top);
                if !self_closing && !is_void(&tag) {
                    open.push(el);
                }
                rest = &rest[consumed..];
            }
            _ => {
                // 不是标签的 '<'
                text.push('<');
                rest = &rest[1..];
            }
        }
    }
    flush_text(doc, &mut text, &open, &mut top);
    top
}

/// 解析并追加到 `parent` 下。
pub fn parse_into(doc: &mut Document, parent: NodeId, markup: &str) {
    for n in parse_fragment(doc, markup) {
        doc.append_child(parent, n);
    }
}

fn attach(doc: &mut Document, node: NodeId, open: &[NodeId], top: &mut Vec<NodeId>) {
    match open.last() {
        Some(&parent) => doc.append_child(parent, node),
        None => top.push(node),
    }
}

fn flush_text(doc: &mut Document, text: &mut String, open: &[NodeId], top: &mut Vec<NodeId>) {
    if text.is_empty() {
        return;
    }
    let node = doc.create_text(decode_entities(text));
    attach(doc, node, open, top);
    text.clear();
}

/// 解析 `<tag a="1" b='2' c d=e>`；返回 (tag, attrs, 自闭合, 消耗的字节数)。
fn parse_open_tag(s: &str) -> (String, Vec<(String, String)>, bool, usize) {
    let bytes = s.as_bytes();
    let mut i = 1;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-') {
        i += 1;
    }
    let tag = s[1..i].to_ascii_lowercase();
    let mut attrs = Vec::new();
    let mut self_closing = false;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        match bytes[i] {
            b'>' => {
                i += 1;
                break;
            }
            b'/' => {
                self_closing = true;
                i += 1;
                continue;
            }
            _ => {}
        }
        let name_start = i;
        while i < bytes.len() && !matches!(bytes[i], b'=' | b'>' | b'/') && !bytes[i].is_ascii_whitespace()
        {
            i += 1;
        }
        let name = s[name_start..i].to_ascii_lowercase();
        let mut value = String::new();
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            match bytes.get(i) {
                Some(&q @ (b'"' | b'\'')) => {
                    let start = i + 1;
                    let end = s[start..].find(q as char).map(|j| start + j).unwrap_or(s.len());
                    value = decode_entities(&s[start..end]);
                    i = (end + 1).min(s.len());
                }
                _ => {
                    let start = i;
                    while i < bytes.len() && bytes[i] != b'>' && !bytes[i].is_ascii_whitespace() {
                        i += 1;
                    }
                    value = decode_entities(&s[start..i]);
                }
            }
        }
        if !name.is_empty() {
            self_closing = false;
            attrs.push((name, value));
        }
    }
    (tag, attrs, self_closing, i)
}

/// 解码常见实体；无法识别的原样保留。
pub fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let ch = match &rest[1..semi] {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                ent => ent
                    .strip_prefix("#x")
                    .or_else(|| ent.strip_prefix("#X"))
                    .and_then(|h| u32::from_str_radix(h, 16).ok())
                    .or_else(|| ent.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            }?;
            Some((ch, semi + 1))
        });
        match decoded {
            Some((ch, len)) => {
                out.push(ch);
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

fn escape_text(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

/// 序列化 `id` 的全部子节点（即元素的 innerHTML）。
pub fn inner_markup(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    for &c in doc.children(id) {
        write_node(doc, c, &mut out);
    }
    out
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.kind(id) {
        Some(NodeKind::Text(t)) => escape_text(t, out),
        Some(NodeKind::Element { tag, attrs }) => {
            out.push('<');
            out.push_str(tag);
            for (k, v) in attrs {
                out.push(' ');
                out.push_str(k);
                out.push_str("=\"");
                out.push_str(&v.replace('&', "&amp;").replace('"', "&quot;"));
                out.push('"');
            }
            out.push('>');
            if is_void(tag) {
                return;
            }
            for &c in doc.children(id) {
                write_node(doc, c, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        Some(NodeKind::Marker) | None => {}
    }
}
