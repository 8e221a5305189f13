//! Expansion of the MDX components posts are allowed to use.
//!
//! Components reach the pipeline as raw HTML nodes in the markdown AST, so
//! code blocks and inline code never pass through here. A tag whose name
//! starts with an uppercase letter is a component; only the names in
//! [`render_component`] are known, anything else fails the render.

use crate::application::render::types::RenderError;

const CALLOUT_KINDS: &[&str] = &["note", "info", "tip", "warning", "danger"];
const DEFAULT_CALLOUT_KIND: &str = "note";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    Block,
    Inline,
}

#[derive(Debug, PartialEq, Eq)]
struct ComponentTag<'a> {
    name: &'a str,
    closing: bool,
    self_closing: bool,
    attributes: Vec<(&'a str, Option<&'a str>)>,
}

impl<'a> ComponentTag<'a> {
    fn attribute(&self, key: &str) -> Option<&'a str> {
        self.attributes
            .iter()
            .find(|(name, _)| *name == key)
            .and_then(|(_, value)| *value)
    }
}

/// Replace every component tag in `raw` with its HTML. Returns `None` when
/// `raw` holds no component at all.
pub(crate) fn expand_components(
    raw: &str,
    placement: Placement,
) -> Result<Option<String>, RenderError> {
    let mut output = String::with_capacity(raw.len());
    let mut rest = raw;
    let mut expanded = false;

    while let Some(start) = rest.find('<') {
        output.push_str(&rest[..start]);
        let candidate = &rest[start..];

        if candidate.starts_with("<!--") {
            let end = candidate
                .find("-->")
                .map(|idx| idx + 3)
                .unwrap_or(candidate.len());
            output.push_str(&candidate[..end]);
            rest = &candidate[end..];
            continue;
        }

        match parse_component_tag(candidate)? {
            Some((tag, consumed)) => {
                output.push_str(&render_component(&tag, placement)?);
                rest = &candidate[consumed..];
                expanded = true;
            }
            None => {
                output.push('<');
                rest = &candidate[1..];
            }
        }
    }
    output.push_str(rest);

    Ok(expanded.then_some(output))
}

fn render_component(tag: &ComponentTag<'_>, placement: Placement) -> Result<String, RenderError> {
    match tag.name {
        "Callout" => Ok(render_callout(tag)),
        "Image" => render_image(tag, placement),
        other => Err(RenderError::UnsupportedComponent {
            name: other.to_string(),
        }),
    }
}

fn render_callout(tag: &ComponentTag<'_>) -> String {
    if tag.closing {
        return "</aside>".to_string();
    }

    let kind = tag
        .attribute("type")
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| CALLOUT_KINDS.contains(&value.as_str()))
        .unwrap_or_else(|| DEFAULT_CALLOUT_KIND.to_string());

    let mut html = format!(
        "<aside class=\"callout callout-{kind}\" data-callout=\"{kind}\" role=\"note\">"
    );
    if let Some(title) = tag.attribute("title").map(str::trim).filter(|t| !t.is_empty()) {
        html.push_str("<p class=\"callout-title\">");
        html.push_str(&escape_attribute(title));
        html.push_str("</p>");
    }
    if tag.self_closing {
        html.push_str("</aside>");
    }
    html
}

fn render_image(tag: &ComponentTag<'_>, placement: Placement) -> Result<String, RenderError> {
    if tag.closing {
        return Ok(String::new());
    }

    let src = tag
        .attribute("src")
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .ok_or_else(|| RenderError::Component {
            name: tag.name.to_string(),
            message: "`src` is required".to_string(),
        })?;
    let alt = tag.attribute("alt").unwrap_or_default();

    let mut img = format!(
        "<img src=\"{}\" alt=\"{}\"",
        escape_attribute(src),
        escape_attribute(alt)
    );
    if placement == Placement::Inline {
        img = img.replacen("<img", "<img class=\"mdx-image\"", 1);
    }
    for key in ["width", "height"] {
        if let Some(value) = tag.attribute(key).and_then(parse_dimension) {
            img.push_str(&format!(" {key}=\"{value}\""));
        }
    }
    img.push_str(" />");

    if placement == Placement::Inline {
        return Ok(img);
    }

    let mut html = String::from("<figure class=\"mdx-image\">");
    html.push_str(&img);
    if let Some(caption) = tag
        .attribute("caption")
        .map(str::trim)
        .filter(|caption| !caption.is_empty())
    {
        html.push_str("<figcaption>");
        html.push_str(&escape_attribute(caption));
        html.push_str("</figcaption>");
    }
    html.push_str("</figure>");
    Ok(html)
}

fn parse_dimension(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u32>().ok().filter(|value| *value > 0)
}

/// Parse a component tag at the start of `input`, which begins with `<`.
/// Returns the tag and the number of bytes it spans, or `None` when the tag
/// is plain HTML.
fn parse_component_tag(input: &str) -> Result<Option<(ComponentTag<'_>, usize)>, RenderError> {
    let mut cursor = 1;
    let closing = input[cursor..].starts_with('/');
    if closing {
        cursor += 1;
    }

    let name_len = input[cursor..]
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '.' || ch == '_'))
        .unwrap_or(input.len() - cursor);
    let name = &input[cursor..cursor + name_len];
    if !name.starts_with(|ch: char| ch.is_ascii_uppercase()) {
        return Ok(None);
    }
    cursor += name_len;

    let malformed = |message: &str| RenderError::Component {
        name: name.to_string(),
        message: message.to_string(),
    };

    let mut attributes = Vec::new();
    let self_closing;
    loop {
        let remaining = &input[cursor..];
        let trimmed = remaining.trim_start();
        cursor += remaining.len() - trimmed.len();

        if trimmed.is_empty() {
            return Err(malformed("tag is never closed"));
        }
        if trimmed.starts_with("/>") {
            cursor += 2;
            self_closing = true;
            break;
        }
        if trimmed.starts_with('>') {
            cursor += 1;
            self_closing = false;
            break;
        }
        if closing {
            return Err(malformed("closing tags take no attributes"));
        }

        let (attribute, consumed) = parse_attribute(trimmed).map_err(malformed)?;
        attributes.push(attribute);
        cursor += consumed;
    }

    Ok(Some((
        ComponentTag {
            name,
            closing,
            self_closing,
            attributes,
        },
        cursor,
    )))
}

type Attribute<'a> = (&'a str, Option<&'a str>);

/// Accepts `key`, `key="v"`, `key='v'`, `key={v}` and `key=v`.
fn parse_attribute(input: &str) -> Result<(Attribute<'_>, usize), &'static str> {
    let name_len = input
        .find(|ch: char| ch.is_whitespace() || matches!(ch, '=' | '>' | '/'))
        .unwrap_or(input.len());
    if name_len == 0 {
        return Err("unexpected character in attribute list");
    }
    let key = &input[..name_len];

    let Some(value_part) = input[name_len..].strip_prefix('=') else {
        return Ok(((key, None), name_len));
    };
    let prefix = name_len + 1;

    match value_part.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let end = value_part[1..]
                .find(quote)
                .ok_or("attribute value is never closed")?;
            Ok(((key, Some(&value_part[1..1 + end])), prefix + end + 2))
        }
        Some('{') => {
            let end = value_part
                .find('}')
                .ok_or("attribute expression is never closed")?;
            let inner = value_part[1..end].trim();
            let unquoted = ['"', '\'', '`']
                .iter()
                .find_map(|quote| {
                    inner
                        .strip_prefix(*quote)
                        .and_then(|rest| rest.strip_suffix(*quote))
                })
                .unwrap_or(inner);
            Ok(((key, Some(unquoted)), prefix + end + 1))
        }
        Some(_) => {
            let mut len = value_part
                .find(|ch: char| ch.is_whitespace() || ch == '>')
                .unwrap_or(value_part.len());
            if value_part[..len].ends_with('/') && value_part[len..].starts_with('>') {
                len -= 1;
            }
            if len == 0 {
                return Err("attribute value is empty");
            }
            Ok(((key, Some(&value_part[..len])), prefix + len))
        }
        None => Err("attribute value is missing"),
    }
}

pub(crate) fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\n' | '\r' | '\t' => escaped.push(' '),
            _ => escaped.push(ch),
        }
    }
    escaped
}
