//! Minimal tag scanning for the vendor's server-rendered pages.
//!
//! The pages are small and regular; this reads opening tags, attribute
//! values, element text and `<script>` bodies without building a DOM.
//! Searches are ASCII case-insensitive on tag names.

/// Opening tags named `name`, without the surrounding `<` and `>`.
pub(crate) fn opening_tags<'a>(html: &'a str, name: &str) -> Vec<&'a str> {
    let lower = html.to_ascii_lowercase();
    let needle = format!("<{}", name.to_ascii_lowercase());
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(rel) = lower[from..].find(&needle) {
        let start = from + rel;
        let after = start + needle.len();
        let boundary = lower[after..]
            .chars()
            .next()
            .is_none_or(|c| c.is_ascii_whitespace() || c == '>' || c == '/');
        let Some(end_rel) = lower[after..].find('>') else {
            break;
        };
        let end = after + end_rel;
        if boundary {
            out.push(&html[start + 1..end]);
        }
        from = end + 1;
    }
    out
}

/// Raw inner content of every `<name ...>...</name>` element.
pub(crate) fn elements<'a>(html: &'a str, name: &str) -> Vec<(&'a str, &'a str)> {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{}", name.to_ascii_lowercase());
    let close = format!("</{}", name.to_ascii_lowercase());
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(rel) = lower[from..].find(&open) {
        let start = from + rel;
        let after = start + open.len();
        let boundary = lower[after..]
            .chars()
            .next()
            .is_none_or(|c| c.is_ascii_whitespace() || c == '>');
        let Some(tag_end_rel) = lower[after..].find('>') else {
            break;
        };
        let body_start = after + tag_end_rel + 1;
        if !boundary {
            from = body_start;
            continue;
        }
        let Some(close_rel) = lower[body_start..].find(&close) else {
            break;
        };
        let body_end = body_start + close_rel;
        out.push((&html[start + 1..body_start - 1], &html[body_start..body_end]));
        from = body_end + close.len();
    }
    out
}

/// Attribute value of `key` in an opening tag (`input type="hidden" name=x`).
pub(crate) fn attr(tag: &str, key: &str) -> Option<String> {
    let bytes = tag.as_bytes();
    let mut i = tag
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(tag.len());
    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
            && !bytes[i].is_ascii_whitespace()
        {
            i += 1;
        }
        let name = &tag[name_start..i];
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let value = if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let quote = bytes[i];
                let start = i + 1;
                let end = tag[start..]
                    .find(char::from(quote))
                    .map_or(tag.len(), |p| start + p);
                i = (end + 1).min(tag.len());
                &tag[start..end]
            } else {
                let start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                &tag[start..i]
            }
        } else {
            ""
        };
        if name.is_empty() {
            // Stray `>` with nothing consumed.
            if i == name_start {
                i += 1;
            }
            continue;
        }
        if name.eq_ignore_ascii_case(key) {
            return Some(decode_entities(value));
        }
    }
    None
}

/// Visible text with tags replaced by line breaks.
pub(crate) fn text_lines(html: &str) -> Vec<String> {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in strip_blocks(html, "script").chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push('\n');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    decode_entities(&text)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Element text collapsed onto one line.
pub(crate) fn inner_text(fragment: &str) -> String {
    text_lines(fragment).join(" ")
}

fn strip_blocks(html: &str, name: &str) -> String {
    let mut out = html.to_string();
    for (_, body) in elements(html, name) {
        out = out.replacen(body, "", 1);
    }
    out
}

pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}
