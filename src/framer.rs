//! Cross-chunk message framing for `From `-separated archives

use tracing::warn;

/// Carry-over ceiling: a boundary-less buffer beyond this is discarded
pub const MAX_CARRY_BYTES: usize = 200 * 1024 * 1024;

/// Reassembles complete raw messages from sequential text chunks.
///
/// A message boundary is a line literally beginning `From ` followed by a
/// non-whitespace token (the envelope sender). A message may straddle any
/// number of chunk reads: the tail of each chunk, from the last boundary
/// line onward, is carried into the next call so that only messages known
/// to be complete are flushed.
#[derive(Debug)]
pub struct MessageFramer {
    carry: String,
    carry_ceiling: usize,
}

impl Default for MessageFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageFramer {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_carry_ceiling(MAX_CARRY_BYTES)
    }

    /// Framer with a non-default carry ceiling, for constrained hosts
    #[must_use]
    pub const fn with_carry_ceiling(carry_ceiling: usize) -> Self {
        Self {
            carry: String::new(),
            carry_ceiling,
        }
    }

    /// Append a chunk and return the raw messages it completed.
    ///
    /// Messages are returned without their envelope line. When the buffer
    /// grows past the carry ceiling without a new boundary, it is discarded
    /// wholesale: a message that large cannot complete within the memory
    /// bound, so this is lossy degradation rather than an error.
    pub fn push_chunk(&mut self, chunk: &str) -> Vec<String> {
        self.carry.push_str(chunk);
        match last_boundary_start(&self.carry) {
            Some(cut) if cut > 0 => {
                let rest = self.carry.split_off(cut);
                let head = std::mem::replace(&mut self.carry, rest);
                split_messages(&head)
            }
            _ => {
                if self.carry.len() > self.carry_ceiling {
                    warn!(
                        dropped = self.carry.len(),
                        "no message boundary within the carry ceiling, discarding buffer"
                    );
                    self.carry.clear();
                }
                Vec::new()
            }
        }
    }

    /// Flush whatever remains at end of file as the final message(s).
    #[must_use]
    pub fn finish(self) -> Vec<String> {
        split_messages(&self.carry)
    }

    /// Bytes currently carried across chunk calls
    #[must_use]
    pub fn carried_bytes(&self) -> usize {
        self.carry.len()
    }
}

/// Does this line open a new message? Literal prefix check per the mbox
/// convention: `From ` then a non-whitespace token.
fn is_boundary_line(line: &str) -> bool {
    line.strip_prefix("From ")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_whitespace())
}

/// Byte offset of the start of the last boundary line, if any.
fn last_boundary_start(buf: &str) -> Option<usize> {
    let mut search_end = buf.len();
    loop {
        let candidate = buf[..search_end].rfind("From ")?;
        let at_line_start = candidate == 0 || buf.as_bytes()[candidate - 1] == b'\n';
        if at_line_start && is_boundary_line(&buf[candidate..]) {
            return Some(candidate);
        }
        if candidate == 0 {
            return None;
        }
        search_end = candidate;
    }
}

/// Split flushed text into raw messages at boundary lines. The boundary
/// line itself is dropped; text before the first boundary (mbox preamble)
/// is ignored.
fn split_messages(text: &str) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = String::new();
    let mut in_message = false;
    for line in text.lines() {
        if is_boundary_line(line) {
            if in_message && !current.is_empty() {
                messages.push(std::mem::take(&mut current));
            }
            current.clear();
            in_message = true;
            continue;
        }
        if in_message {
            current.push_str(line);
            current.push('\n');
        }
    }
    if in_message && !current.is_empty() {
        messages.push(current);
    }
    messages
}
