//! Error types for mailbox archive parsing

use thiserror::Error;

/// Fatal errors that abort an entire parse run
#[derive(Error, Debug)]
pub enum MboxError {
    /// A window read failed; the run aborts with no partial result
    #[error("failed to read {len} bytes at offset {offset}: {source}")]
    Read {
        offset: u64,
        len: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Errors local to a single message; the message is skipped and counted
#[derive(Error, Debug)]
pub enum ParseError {
    /// No blank line separating the header block from the body
    #[error("no header/body separator found")]
    MissingBodySeparator,
}

/// Errors inside body decoding; callers fall back to the undecoded text
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Payload was not valid base64
    #[error("invalid base64 payload: {0}")]
    Base64(String),

    /// Malformed `=XX` escape sequence
    #[error("invalid quoted-printable escape at byte {0}")]
    QuotedPrintable(usize),
}

/// Result type for whole-run parsing operations
pub type Result<T> = std::result::Result<T, MboxError>;
