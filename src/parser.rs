//! Orchestrates the chunk, frame, parse, decode, and filter stages

use crate::decode;
use crate::error::{MboxError, ParseError, Result};
use crate::filter::{self, FilterPolicy};
use crate::framer::MessageFramer;
use crate::headers;
use crate::reader::ChunkSource;
use crate::types::{
    MboxParseOptions, MboxParseResult, MessageId, ParsedEmail, ProgressCallback, ProgressUpdate,
};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::debug;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Scan progress tops out here; the 70-100 band belongs to the downstream
/// upload phase, which this crate does not drive.
const SCAN_PERCENT_CEILING: u8 = 70;

/// Parse a mailbox archive into a bounded set of normalized email records.
///
/// The source is read one fixed-size window at a time; messages straddling
/// window edges are reassembled before parsing. Once `max_emails` records
/// have been accepted the scan stops issuing reads, so after an early stop
/// `total_emails_found` reflects only the messages scanned up to that
/// point, not the true total in the file.
///
/// Control is yielded back to the runtime between windows so a long scan
/// stays cooperative. Progress callbacks fire at most every ~100 ms with
/// non-decreasing percentages in `[0, 70]`.
///
/// # Errors
///
/// Returns [`MboxError::Read`] if any window read fails; no partial result
/// is salvaged. Individual malformed messages do not error: they increment
/// `parse_errors` and scanning continues.
pub async fn parse_mbox<S: ChunkSource>(
    source: &mut S,
    options: MboxParseOptions,
) -> Result<MboxParseResult> {
    let MboxParseOptions {
        max_emails,
        min_content_length,
        only_from_email,
        chunk_size,
        on_progress,
    } = options;

    let total = source.len();
    let mut progress = ProgressReporter::new(on_progress);
    let mut framer = MessageFramer::new();
    let mut pipeline = Pipeline::new(
        FilterPolicy::new(min_content_length, only_from_email),
        max_emails,
    );

    let mut offset: u64 = 0;
    while offset < total && !pipeline.at_capacity() {
        let want = usize::try_from(total - offset).map_or(chunk_size, |rest| rest.min(chunk_size));
        let bytes = source
            .read_range(offset, want)
            .map_err(|err| MboxError::Read {
                offset,
                len: want,
                source: err,
            })?;
        if bytes.is_empty() {
            // a source that under-reports its size
            break;
        }
        offset += bytes.len() as u64;
        let text = String::from_utf8_lossy(&bytes);
        for raw in framer.push_chunk(&text) {
            if pipeline.at_capacity() {
                break;
            }
            pipeline.ingest(&raw);
        }
        progress.report(offset, total, pipeline.accepted(), "scanning");
        tokio::task::yield_now().await;
    }

    if !pipeline.at_capacity() {
        for raw in framer.finish() {
            if pipeline.at_capacity() {
                break;
            }
            pipeline.ingest(&raw);
        }
    }

    let result = pipeline.into_result();
    progress.finish(offset, total, result.emails.len(), "scan complete");
    debug!(
        found = result.total_emails_found,
        parsed = result.emails_parsed,
        filtered = result.emails_filtered,
        errors = result.parse_errors,
        "mailbox scan finished"
    );
    Ok(result)
}

/// Per-run parsing state threaded through the scan loop
struct Pipeline {
    policy: FilterPolicy,
    max_emails: usize,
    seen_hashes: HashSet<String>,
    result: MboxParseResult,
    sequence: usize,
}

impl Pipeline {
    fn new(policy: FilterPolicy, max_emails: usize) -> Self {
        Self {
            policy,
            max_emails,
            seen_hashes: HashSet::new(),
            result: MboxParseResult::default(),
            sequence: 0,
        }
    }

    fn at_capacity(&self) -> bool {
        self.result.emails.len() >= self.max_emails
    }

    fn accepted(&self) -> usize {
        self.result.emails.len()
    }

    fn into_result(self) -> MboxParseResult {
        self.result
    }

    /// Run one raw message through parse, decode, and filter.
    fn ingest(&mut self, raw: &str) {
        self.result.total_emails_found += 1;
        self.sequence += 1;
        match self.parse_one(raw) {
            Ok(email) => match self.policy.evaluate(&email, &self.seen_hashes) {
                Some(reason) => {
                    self.result.emails_filtered += 1;
                    *self.result.skipped_reasons.entry(reason).or_insert(0) += 1;
                }
                None => {
                    self.seen_hashes.insert(email.content_hash.clone());
                    debug!(message_id = %email.message_id, "accepted message");
                    self.result.emails_parsed += 1;
                    self.result.emails.push(email);
                }
            },
            Err(err) => {
                debug!(%err, "skipping unparseable message");
                self.result.parse_errors += 1;
            }
        }
    }

    fn parse_one(&self, raw: &str) -> std::result::Result<ParsedEmail, ParseError> {
        let (hdrs, body) = headers::split_message(raw)?;
        let from = headers::clean_address(hdrs.get("from").unwrap_or_default());
        let to = headers::clean_address(hdrs.get("to").unwrap_or_default());
        let subject = headers::decode_encoded_words(hdrs.get("subject").unwrap_or_default());
        let date = headers::parse_date(hdrs.get("date"));
        let message_id = hdrs.get("message-id").map_or_else(
            || MessageId::generated(self.sequence),
            |id| MessageId::new(id.trim()),
        );
        let text_content = decode::decode_body(&hdrs, body);
        let content_hash = filter::content_hash(&subject, &from, &text_content);
        Ok(ParsedEmail {
            message_id,
            from,
            to,
            subject,
            date,
            text_content,
            content_hash,
        })
    }
}

/// Throttled, monotonic progress emission
struct ProgressReporter {
    callback: Option<ProgressCallback>,
    last_emit: Option<Instant>,
    last_percent: u8,
}

impl ProgressReporter {
    fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            last_emit: None,
            last_percent: 0,
        }
    }

    fn report(&mut self, bytes_read: u64, total: u64, emails_found: usize, status: &str) {
        if let Some(last) = self.last_emit
            && last.elapsed() < PROGRESS_INTERVAL
        {
            return;
        }
        self.emit(bytes_read, total, emails_found, status);
    }

    /// Final update, exempt from the throttle interval
    fn finish(&mut self, bytes_read: u64, total: u64, emails_found: usize, status: &str) {
        self.emit(bytes_read, total, emails_found, status);
    }

    fn emit(&mut self, bytes_read: u64, total: u64, emails_found: usize, status: &str) {
        let Some(callback) = self.callback.as_mut() else {
            return;
        };
        let percent = scan_percent(bytes_read, total).max(self.last_percent);
        self.last_percent = percent;
        self.last_emit = Some(Instant::now());
        callback(ProgressUpdate {
            percent,
            emails_found,
            status: status.to_string(),
        });
    }
}

fn scan_percent(bytes_read: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let scaled = bytes_read.saturating_mul(u64::from(SCAN_PERCENT_CEILING)) / total;
    u8::try_from(scaled.min(u64::from(SCAN_PERCENT_CEILING))).unwrap_or(SCAN_PERCENT_CEILING)
}
