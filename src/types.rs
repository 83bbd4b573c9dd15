//! Core types for mailbox archive parsing

use crate::reader::DEFAULT_CHUNK_SIZE;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Default cap on accepted records per run
pub const DEFAULT_MAX_EMAILS: usize = 100;

/// Default minimum decoded-text length for acceptance
pub const DEFAULT_MIN_CONTENT_LENGTH: usize = 50;

/// A normalized email record emitted for downstream ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedEmail {
    /// Header-derived identifier, or a generated fallback if absent
    pub message_id: MessageId,

    /// Cleaned sender address
    pub from: String,

    /// Cleaned primary recipient
    pub to: String,

    /// Subject with RFC-2047 encoded words decoded
    pub subject: String,

    /// Date header, falling back to the scan time when unparsable
    pub date: DateTime<Utc>,

    /// Fully decoded, HTML-stripped plain text
    pub text_content: String,

    /// Fingerprint of subject, sender, and text, for in-run dedup
    pub content_hash: String,
}

/// Message ID wrapper type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fallback ID for messages without a Message-ID header
    #[must_use]
    pub fn generated(sequence: usize) -> Self {
        Self(format!("<generated-{sequence}@mbox.local>"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a message was rejected rather than emitted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Decoded body had no text at all
    EmptyContent,

    /// Decoded text shorter than the configured minimum
    ContentTooShort,

    /// Content hash already seen this run
    DuplicateContent,

    /// Sender did not match the `only_from_email` filter
    NotFromUser,
}

impl SkipReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyContent => "empty_content",
            Self::ContentTooShort => "content_too_short",
            Self::DuplicateContent => "duplicate_content",
            Self::NotFromUser => "not_from_user",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress snapshot passed to the caller's callback
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Scan progress in `[0, 70]`; the 70-100 band is reserved for the
    /// downstream upload phase
    pub percent: u8,

    /// Records accepted so far
    pub emails_found: usize,

    /// Human-readable phase label
    pub status: String,
}

/// Progress callback, invoked at most every ~100 ms
pub type ProgressCallback = Box<dyn FnMut(ProgressUpdate) + Send>;

/// Tuning knobs for one parse run
pub struct MboxParseOptions {
    /// Stop scanning once this many records are accepted
    pub max_emails: usize,

    /// Reject decoded bodies shorter than this
    pub min_content_length: usize,

    /// When set, only accept senders containing this substring
    /// (case-insensitive)
    pub only_from_email: Option<String>,

    /// Read window size; tests inject small windows to exercise messages
    /// straddling window edges
    pub chunk_size: usize,

    /// Throttled progress callback
    pub on_progress: Option<ProgressCallback>,
}

impl Default for MboxParseOptions {
    fn default() -> Self {
        Self {
            max_emails: DEFAULT_MAX_EMAILS,
            min_content_length: DEFAULT_MIN_CONTENT_LENGTH,
            only_from_email: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            on_progress: None,
        }
    }
}

impl fmt::Debug for MboxParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MboxParseOptions")
            .field("max_emails", &self.max_emails)
            .field("min_content_length", &self.min_content_length)
            .field("only_from_email", &self.only_from_email)
            .field("chunk_size", &self.chunk_size)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Aggregate outcome of one parse run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MboxParseResult {
    /// Accepted records, in file order
    pub emails: Vec<ParsedEmail>,

    /// Messages scanned; undercounts the file when the cap stopped the
    /// scan early
    pub total_emails_found: usize,

    /// Messages accepted into `emails`
    pub emails_parsed: usize,

    /// Messages rejected by the filter policy
    pub emails_filtered: usize,

    /// Messages that failed header/body decomposition
    pub parse_errors: usize,

    /// Rejection counts per reason; values sum to `emails_filtered`
    pub skipped_reasons: HashMap<SkipReason, usize>,
}
