use chrono::Utc;
use mbox_ingest::{clean_address, decode_encoded_words, parse_date, split_message};

// --- header/body splitting ---

#[test]
fn test_split_at_bare_newline_blank_line() {
    let (headers, body) = split_message("Subject: Hi\nFrom: a@example.com\n\nBody text").unwrap();

    assert_eq!(headers.get("subject"), Some("Hi"));
    assert_eq!(headers.get("from"), Some("a@example.com"));
    assert_eq!(body, "Body text");
}

#[test]
fn test_split_at_crlf_blank_line() {
    let (headers, body) = split_message("Subject: Hi\r\nFrom: a@example.com\r\n\r\nBody").unwrap();

    assert_eq!(headers.get("from"), Some("a@example.com"));
    assert_eq!(body, "Body");
}

#[test]
fn test_header_lookup_is_case_insensitive() {
    let (headers, _) = split_message("Content-Type: text/plain\n\nx").unwrap();

    assert_eq!(headers.get("content-type"), Some("text/plain"));
    assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
}

#[test]
fn test_folded_header_is_space_joined() {
    let raw = "Subject: part one\n  part two\nFrom: a@example.com\n\nBody";
    let (headers, _) = split_message(raw).unwrap();

    assert_eq!(headers.get("subject"), Some("part one part two"));
    assert_eq!(headers.get("from"), Some("a@example.com"));
}

#[test]
fn test_colonless_line_drops_continuation_context() {
    let raw = "Subject: one\nthis line has no separator\n stray continuation\n\nBody";
    let (headers, _) = split_message(raw).unwrap();

    // the stray continuation must not leak into the previous header
    assert_eq!(headers.get("subject"), Some("one"));
    assert_eq!(headers.len(), 1);
}

#[test]
fn test_missing_blank_line_is_an_error() {
    assert!(split_message("Subject: headers only\nFrom: a@example.com\n").is_err());
}

// --- address cleanup ---

#[test]
fn test_clean_address_extracts_angle_brackets() {
    assert_eq!(
        clean_address("Jo Doe <jo@example.com>"),
        "jo@example.com".to_string()
    );
    assert_eq!(
        clean_address("\"Quoted Name\" <q@example.com>"),
        "q@example.com".to_string()
    );
}

#[test]
fn test_clean_address_passes_plain_addresses_through() {
    assert_eq!(clean_address("  plain@example.com "), "plain@example.com");
    assert_eq!(clean_address("not an address"), "not an address");
}

// --- RFC 2047 encoded words ---

#[test]
fn test_decode_encoded_word_b() {
    assert_eq!(decode_encoded_words("=?UTF-8?B?SGVsbG8=?="), "Hello");
}

#[test]
fn test_decode_encoded_word_q() {
    assert_eq!(decode_encoded_words("=?UTF-8?Q?Hello_World?="), "Hello World");
}

#[test]
fn test_decode_encoded_word_q_hex_escape() {
    assert_eq!(decode_encoded_words("=?UTF-8?Q?caf=C3=A9?="), "caf\u{e9}");
}

#[test]
fn test_decode_encoded_word_latin1() {
    assert_eq!(decode_encoded_words("=?ISO-8859-1?Q?caf=E9?="), "caf\u{e9}");
}

#[test]
fn test_encoded_word_mixed_with_literal_text() {
    assert_eq!(
        decode_encoded_words("Hi =?UTF-8?B?V29ybGQ=?=!"),
        "Hi World!"
    );
}

#[test]
fn test_undecodable_encoded_word_left_as_is() {
    let raw = "=?UTF-8?B?%%%?=";
    assert_eq!(decode_encoded_words(raw), raw);
}

// --- dates ---

#[test]
fn test_parse_date_rfc2822() {
    let date = parse_date(Some("Thu, 01 Jan 2026 12:00:00 +0000"));
    assert_eq!(date.to_rfc3339(), "2026-01-01T12:00:00+00:00");
}

#[test]
fn test_parse_date_falls_back_to_now() {
    let before = Utc::now();
    assert!(parse_date(Some("not a date")) >= before);
    assert!(parse_date(None) >= before);
}
