// Enforce at crate level
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Bounded-Memory Mailbox Archive Ingestion
//!
//! Scans a `From `-separated mailbox archive one fixed-size window at a
//! time, reassembles messages that straddle window edges, decodes their
//! bodies (base64, quoted-printable, multipart/MIME, HTML-to-text), and
//! emits a capped, deduplicated set of normalized records for a
//! downstream ingestion service.
//!
//! # Features
//!
//! - Whole-file memory never exceeds one read window plus a bounded
//!   carry-over buffer, regardless of archive size
//! - Messages are reassembled correctly across window edges
//! - Transfer encodings and multipart structure decoded without a full
//!   MIME library; decode failures degrade to the original text
//! - Per-run deduplication and sender/length filtering with per-reason
//!   skip counts
//! - Throttled progress reporting scaled to the scan phase
//!
//! # Example
//!
//! ```rust
//! use mbox_ingest::{parse_mbox, MboxParseOptions, MemorySource};
//!
//! let archive = "From alice@example.com Thu Jan  1 10:00:00 2026\n\
//!                From: Alice <alice@example.com>\n\
//!                Subject: Hello\n\
//!                \n\
//!                Hello Bob, this is a long enough note to clear the\n\
//!                default length filter used for ingestion records.\n";
//!
//! let mut source = MemorySource::new(archive);
//! let result =
//!     tokio_test::block_on(parse_mbox(&mut source, MboxParseOptions::default())).unwrap();
//!
//! assert_eq!(result.emails.len(), 1);
//! assert_eq!(result.emails[0].from, "alice@example.com");
//! ```

mod decode;
mod error;
mod filter;
mod framer;
mod headers;
mod parser;
mod reader;
mod types;

pub use decode::{decode_base64, decode_body, decode_quoted_printable, strip_html};
pub use error::{DecodeError, MboxError, ParseError, Result};
pub use filter::{FilterPolicy, content_hash};
pub use framer::{MAX_CARRY_BYTES, MessageFramer};
pub use headers::{Headers, clean_address, decode_encoded_words, parse_date, split_message};
pub use parser::parse_mbox;
pub use reader::{ChunkSource, DEFAULT_CHUNK_SIZE, FileSource, MemorySource};
pub use types::*;
