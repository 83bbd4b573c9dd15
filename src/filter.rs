//! Acceptance policy: empty/short/duplicate/sender rejection and the
//! content fingerprint backing deduplication

use crate::types::{ParsedEmail, SkipReason};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt::Write as _;

/// Fingerprint of `subject|from|text`, hex encoded. Only meaningful within
/// a single parse run.
#[must_use]
pub fn content_hash(subject: &str, from: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(subject.as_bytes());
    hasher.update(b"|");
    hasher.update(from.as_bytes());
    hasher.update(b"|");
    hasher.update(text.as_bytes());
    hasher.finalize().iter().fold(String::new(), |mut hex, b| {
        let _ = write!(hex, "{b:02x}");
        hex
    })
}

/// Accept/reject rules applied to each decoded candidate record
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    min_content_length: usize,
    only_from_email: Option<String>,
}

impl FilterPolicy {
    #[must_use]
    pub fn new(min_content_length: usize, only_from_email: Option<String>) -> Self {
        Self {
            min_content_length,
            only_from_email: only_from_email.map(|s| s.to_lowercase()),
        }
    }

    /// First rejection reason that applies, or `None` to accept.
    ///
    /// Reasons are evaluated in a fixed priority order and only the first
    /// match is reported.
    #[must_use]
    pub fn evaluate(&self, email: &ParsedEmail, seen: &HashSet<String>) -> Option<SkipReason> {
        if email.text_content.trim().is_empty() {
            return Some(SkipReason::EmptyContent);
        }
        if email.text_content.len() < self.min_content_length {
            return Some(SkipReason::ContentTooShort);
        }
        if seen.contains(&email.content_hash) {
            return Some(SkipReason::DuplicateContent);
        }
        if let Some(wanted) = &self.only_from_email
            && !email.from.to_lowercase().contains(wanted)
        {
            return Some(SkipReason::NotFromUser);
        }
        None
    }
}
