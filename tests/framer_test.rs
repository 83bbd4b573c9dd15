use mbox_ingest::MessageFramer;

fn feed_in_slices(archive: &str, size: usize) -> Vec<String> {
    let mut framer = MessageFramer::new();
    let mut out = Vec::new();
    let bytes = archive.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        let end = (pos + size).min(bytes.len());
        out.extend(framer.push_chunk(std::str::from_utf8(&bytes[pos..end]).unwrap()));
        pos = end;
    }
    out.extend(framer.finish());
    out
}

#[test]
fn test_two_messages_split_without_envelope_lines() {
    let archive = "From a@example.com Thu Jan  1 10:00:00 2026\n\
                   Subject: One\n\
                   \n\
                   Body one.\n\
                   From b@example.com Thu Jan  1 11:00:00 2026\n\
                   Subject: Two\n\
                   \n\
                   Body two.\n";

    let mut framer = MessageFramer::new();
    let mut messages = framer.push_chunk(archive);
    messages.extend(framer.finish());

    assert_eq!(messages.len(), 2);
    assert!(messages[0].contains("Body one."));
    assert!(!messages[0].contains("From a@example.com Thu"));
    assert!(messages[1].contains("Subject: Two"));
}

#[test]
fn test_last_message_flushed_at_finish_only() {
    let archive = "From a@example.com Thu Jan  1 10:00:00 2026\n\
                   Subject: Solo\n\
                   \n\
                   Only one message here.\n";

    let mut framer = MessageFramer::new();
    assert!(framer.push_chunk(archive).is_empty());

    let messages = framer.finish();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Only one message here."));
}

#[test]
fn test_messages_identical_across_chunk_sizes() {
    let mut archive = String::new();
    for i in 0..3 {
        archive.push_str(&format!(
            "From sender{i}@example.com Thu Jan  1 10:00:00 2026\n\
             Subject: Message {i}\n\
             \n\
             The body of message number {i} spans\n\
             two lines to make straddling likely.\n"
        ));
    }

    let whole = feed_in_slices(&archive, archive.len());
    assert_eq!(whole.len(), 3);

    for size in [1, 3, 7, 16, 64] {
        assert_eq!(feed_in_slices(&archive, size), whole, "chunk size {size}");
    }
}

#[test]
fn test_preamble_before_first_boundary_ignored() {
    let archive = "some mailbox preamble text\n\
                   From a@example.com Thu Jan  1 10:00:00 2026\n\
                   Subject: One\n\
                   \n\
                   Body one.\n";

    let messages = feed_in_slices(archive, archive.len());
    assert_eq!(messages.len(), 1);
    assert!(!messages[0].contains("preamble"));
}

#[test]
fn test_from_without_token_is_not_a_boundary() {
    let archive = "From a@example.com Thu Jan  1 10:00:00 2026\n\
                   Subject: One\n\
                   \n\
                   From  \n\
                   From \n\
                   Body continues after those lines.\n";

    let messages = feed_in_slices(archive, archive.len());
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Body continues after those lines."));
}

#[test]
fn test_boundaryless_buffer_discarded_at_ceiling() {
    let mut framer = MessageFramer::with_carry_ceiling(64);

    let junk = "x".repeat(100);
    assert!(framer.push_chunk(&junk).is_empty());
    assert_eq!(framer.carried_bytes(), 0);

    // the framer keeps working after the lossy discard
    let out = framer.push_chunk(
        "From a@example.com Thu Jan  1 10:00:00 2026\n\
         Subject: After\n\
         \n\
         Recovered message body.\n\
         From b@example.com Thu Jan  1 11:00:00 2026\n",
    );
    assert_eq!(out.len(), 1);
    assert!(out[0].contains("Recovered message body."));
}

#[test]
fn test_small_buffer_without_boundary_is_kept() {
    let mut framer = MessageFramer::new();
    assert!(framer.push_chunk("no boundary yet").is_empty());
    assert_eq!(framer.carried_bytes(), "no boundary yet".len());
}
