//! Body decoding: transfer encodings, multipart descent, HTML-to-text

use crate::error::DecodeError;
use crate::headers::{self, Headers};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static BOUNDARY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"boundary\s*=\s*"?([^";\r\n]+)"?"#).unwrap());

/// Decode a message body into plain text using its parsed headers.
///
/// Multipart bodies resolve to their first `text/plain` part, falling back
/// to the first `text/html` part stripped to text. Transfer-encoding or
/// HTML decode failures fall back to the corresponding undecoded text;
/// this function never errors.
#[must_use]
pub fn decode_body(msg_headers: &Headers, body: &str) -> String {
    // boundary values are case-sensitive, so extract from the raw header
    let raw_content_type = msg_headers.get("content-type").unwrap_or_default();
    let content_type = raw_content_type.to_ascii_lowercase();
    if content_type.contains("multipart/")
        && let Some(boundary) = extract_boundary(raw_content_type)
    {
        return decode_multipart(body, &boundary);
    }
    let text = decode_transfer_encoding(msg_headers, body);
    if content_type.contains("text/html") {
        strip_html(&text)
    } else {
        text
    }
}

fn decode_transfer_encoding(part_headers: &Headers, body: &str) -> String {
    let encoding = part_headers
        .get("content-transfer-encoding")
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let decoded = if encoding.contains("base64") {
        decode_base64(body)
    } else if encoding.contains("quoted-printable") {
        decode_quoted_printable(body)
    } else {
        return body.to_string();
    };
    match decoded {
        Ok(text) => text,
        Err(err) => {
            debug!(%err, "transfer decode failed, keeping original text");
            body.to_string()
        }
    }
}

/// Decode a base64 transfer-encoded body. Line breaks and other whitespace
/// are stripped before decoding.
pub fn decode_base64(body: &str) -> Result<String, DecodeError> {
    let compact: String = body.split_whitespace().collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| DecodeError::Base64(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Decode a quoted-printable transfer-encoded body.
///
/// Soft line breaks (`=` at end of line) are removed and `=XX` escapes
/// replaced by the corresponding byte. A malformed escape is an error so
/// callers can fall back to the original text.
pub fn decode_quoted_printable(body: &str) -> Result<String, DecodeError> {
    let bytes = body.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'=' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        match (bytes.get(i + 1), bytes.get(i + 2)) {
            (Some(b'\r'), Some(b'\n')) => i += 3,
            (Some(b'\n'), _) => i += 2,
            (Some(&hi), Some(&lo)) => match (hex_value(hi), hex_value(lo)) {
                (Some(h), Some(l)) => {
                    out.push((h << 4) | l);
                    i += 3;
                }
                _ => return Err(DecodeError::QuotedPrintable(i)),
            },
            _ => return Err(DecodeError::QuotedPrintable(i)),
        }
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}

pub(crate) const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

fn extract_boundary(content_type: &str) -> Option<String> {
    BOUNDARY_REGEX
        .captures(content_type)
        .map(|caps| caps[1].trim().to_string())
}

/// Walk multipart parts with an explicit work stack, preferring the first
/// `text/plain` part in document order, then the first `text/html` part
/// stripped to text. All other parts (attachments etc.) are skipped.
fn decode_multipart(body: &str, boundary: &str) -> String {
    let mut stack: Vec<String> = Vec::new();
    push_parts(&mut stack, body, boundary);

    let mut html_fallback: Option<String> = None;
    while let Some(part) = stack.pop() {
        let Ok((part_headers, part_body)) = headers::split_message(&part) else {
            continue;
        };
        let raw_content_type = part_headers.get("content-type").unwrap_or("text/plain");
        let content_type = raw_content_type.to_ascii_lowercase();
        if content_type.contains("multipart/") {
            if let Some(inner) = extract_boundary(raw_content_type) {
                push_parts(&mut stack, part_body, &inner);
            }
            continue;
        }
        if content_type.contains("text/plain") {
            return decode_transfer_encoding(&part_headers, part_body);
        }
        if content_type.contains("text/html") && html_fallback.is_none() {
            html_fallback = Some(strip_html(&decode_transfer_encoding(
                &part_headers,
                part_body,
            )));
        }
    }
    html_fallback.unwrap_or_default()
}

/// Split on `--boundary` markers and push the parts so that popping the
/// stack yields them in document order. The preamble before the first
/// marker and the text after the closing `--boundary--` are dropped.
fn push_parts(stack: &mut Vec<String>, body: &str, boundary: &str) {
    let marker = format!("--{boundary}");
    let mut parts: Vec<String> = body
        .split(marker.as_str())
        .skip(1)
        .filter(|part| !part.starts_with("--"))
        .map(|part| part.trim_matches(['\r', '\n']).to_string())
        .filter(|part| !part.is_empty())
        .collect();
    parts.reverse();
    stack.append(&mut parts);
}

/// Strip HTML down to readable text: `<script>`/`<style>` blocks and all
/// tags are removed, common entities decoded, whitespace collapsed.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while pos < html.len() {
        let Some(open) = html[pos..].find('<').map(|i| pos + i) else {
            out.push_str(&html[pos..]);
            break;
        };
        out.push_str(&html[pos..open]);
        if lower[open..].starts_with("<script") {
            pos = skip_block(&lower, open, "</script");
            continue;
        }
        if lower[open..].starts_with("<style") {
            pos = skip_block(&lower, open, "</style");
            continue;
        }
        let Some(close) = html[open..].find('>').map(|i| open + i) else {
            // unterminated tag: drop the rest
            break;
        };
        if ends_text_block(&lower[open + 1..close]) {
            out.push('\n');
        }
        pos = close + 1;
    }

    decode_entities(&out)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Byte offset just past the closing tag's `>`, or end of input.
fn skip_block(lower: &str, from: usize, close_tag: &str) -> usize {
    lower[from..].find(close_tag).map_or(lower.len(), |i| {
        let close_start = from + i;
        lower[close_start..]
            .find('>')
            .map_or(lower.len(), |j| close_start + j + 1)
    })
}

fn ends_text_block(tag: &str) -> bool {
    tag.starts_with("br")
        || tag.starts_with("/p")
        || tag.starts_with("/div")
        || tag.starts_with("/li")
        || tag.starts_with("/h")
        || tag.starts_with("/tr")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}
