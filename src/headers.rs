//! RFC-5322-style header parsing: block splitting, folded headers,
//! encoded words, addresses, dates

use crate::decode::hex_value;
use crate::error::ParseError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static ENCODED_WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=\?([^?]+)\?([bBqQ])\?([^?]*)\?=").unwrap());

/// Parsed header block with case-insensitive lookup
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// First value for `name`, matched case-insensitively
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split a raw message into its parsed header block and body.
///
/// The boundary is the first blank line, in either bare-newline or
/// CRLF form.
pub fn split_message(raw: &str) -> Result<(Headers, &str), ParseError> {
    let (header_block, body) =
        split_at_blank_line(raw).ok_or(ParseError::MissingBodySeparator)?;
    Ok((parse_header_block(header_block), body))
}

fn split_at_blank_line(raw: &str) -> Option<(&str, &str)> {
    let lf = raw.find("\n\n");
    let crlf = raw.find("\r\n\r\n");
    match (lf, crlf) {
        (Some(l), Some(c)) if c < l => Some((&raw[..c], &raw[c + 4..])),
        (Some(l), _) => Some((&raw[..l], &raw[l + 2..])),
        (None, Some(c)) => Some((&raw[..c], &raw[c + 4..])),
        (None, None) => None,
    }
}

/// Parse key:value header lines. A line starting with whitespace continues
/// the previous header (folded form, space-joined); a colon-less line with
/// no leading whitespace drops the continuation context instead of failing.
fn parse_header_block(block: &str) -> Headers {
    let mut entries: Vec<(String, String)> = Vec::new();
    let mut in_header = false;
    for line in block.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if in_header && let Some((_, value)) = entries.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            entries.push((key.trim().to_string(), value.trim().to_string()));
            in_header = true;
        } else {
            in_header = false;
        }
    }
    Headers { entries }
}

/// Extract the bare address from forms like `"Jo Doe" <jo@example.com>`
#[must_use]
pub fn clean_address(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(start) = raw.find('<')
        && let Some(end) = raw.rfind('>')
        && start < end
    {
        return raw[start + 1..end].trim().to_string();
    }
    raw.to_string()
}

/// Expand RFC-2047 encoded words (`=?charset?enc?payload?=`) in a header
/// value. Supports B and Q encodings; a word that fails to decode is left
/// as-is.
#[must_use]
pub fn decode_encoded_words(raw: &str) -> String {
    ENCODED_WORD_REGEX
        .replace_all(raw, |caps: &Captures<'_>| {
            let charset = &caps[1];
            let payload = &caps[3];
            let bytes = if caps[2].eq_ignore_ascii_case("b") {
                STANDARD.decode(payload).ok()
            } else {
                decode_q_payload(payload)
            };
            bytes.map_or_else(|| caps[0].to_string(), |b| charset_to_string(&b, charset))
        })
        .into_owned()
}

/// Q encoding: `_` is a space, the rest is quoted-printable.
fn decode_q_payload(payload: &str) -> Option<Vec<u8>> {
    let bytes = payload.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                out.push(b' ');
                i += 1;
            }
            b'=' => {
                let hi = hex_value(*bytes.get(i + 1)?)?;
                let lo = hex_value(*bytes.get(i + 2)?)?;
                out.push((hi << 4) | lo);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Some(out)
}

fn charset_to_string(bytes: &[u8], charset: &str) -> String {
    if charset.eq_ignore_ascii_case("iso-8859-1") || charset.eq_ignore_ascii_case("latin1") {
        bytes.iter().map(|&b| char::from(b)).collect()
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

/// Parse an RFC-2822 `Date` header, falling back to the current time
#[must_use]
pub fn parse_date(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|value| DateTime::parse_from_rfc2822(value.trim()).ok())
        .map_or_else(Utc::now, |dt| dt.with_timezone(&Utc))
}
