//! Frame layer (spec §4.2, L2): splits/joins MySQL packets and enforces sequence-number
//! discipline. This module owns no sockets — it only turns bytes into logical messages and
//! back; [`crate::connection::stream`] drives it against the actual transport.

use crate::error::Error;

/// A frame header: 3-byte little-endian payload length, 1-byte sequence number (spec §3, §6).
pub const HEADER_LEN: usize = 4;

/// The maximum payload a single frame can carry; a logical message whose payload is exactly
/// this long is followed by another frame (spec §3).
pub const MAX_FRAME_PAYLOAD: usize = 0xFF_FFFF; // 2^24 - 1

pub const DEFAULT_INITIAL_BUFFER_SIZE: usize = 1024;
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// A fully reassembled logical message (spec §3, §4.2): one or more frames' payloads
/// concatenated, plus the bookkeeping the frame layer promises to expose.
#[derive(Debug, Clone)]
pub struct Message {
    pub payload: Vec<u8>,
    pub first_seqnum: u8,
    pub last_seqnum: u8,
    pub seqnum_mismatch: bool,
    /// What the shared [`SeqCounter`] held before this message's first frame was read, i.e.
    /// what `first_seqnum` was expected to be. Only meaningful when `seqnum_mismatch` is set.
    pub expected_first_seqnum: u8,
}

/// Sequence-number state shared by the reader and writer halves of one connection — spec §3
/// says the counter is continuous across logical messages unless explicitly reset (e.g. on
/// `reset-connection`, or at the start of a fresh command).
#[derive(Debug, Clone, Copy, Default)]
pub struct SeqCounter(pub u8);

impl SeqCounter {
    pub fn reset(&mut self) {
        self.0 = 0;
    }

    pub fn next(&mut self) -> u8 {
        let v = self.0;
        self.0 = self.0.wrapping_add(1);
        v
    }
}

/// Splits one logical payload into 4-byte-header frames, honoring the `2^24-1`-byte cap
/// (spec §4.2 Writer contract). Always emits at least one frame, even for an empty payload.
/// Advances `seq` by the number of frames written.
pub fn write_frames(payload: &[u8], seq: &mut SeqCounter, out: &mut Vec<u8>) {
    let mut remaining = payload;
    loop {
        let chunk_len = remaining.len().min(MAX_FRAME_PAYLOAD);
        let (chunk, rest) = remaining.split_at(chunk_len);

        out.extend_from_slice(&(chunk_len as u32).to_le_bytes()[..3]);
        out.push(seq.next());
        out.extend_from_slice(chunk);

        remaining = rest;
        if chunk_len < MAX_FRAME_PAYLOAD {
            break;
        }
    }
}

/// Decodes one `(payload_len, seqnum)` frame header. Returns `None` if fewer than
/// [`HEADER_LEN`] bytes are available (caller should read more and retry).
pub fn read_header(buf: &[u8]) -> Option<(usize, u8)> {
    if buf.len() < HEADER_LEN {
        return None;
    }
    let len = u32::from_le_bytes([buf[0], buf[1], buf[2], 0]) as usize;
    let seq = buf[3];
    Some((len, seq))
}

/// Incremental reassembler for the read side of the frame layer (spec §4.2 Reader contract).
///
/// Owns no socket; callers feed it bytes as they arrive (`feed`) and poll `try_take_message`
/// for completed messages. This mirrors the teacher's `MySqlStream` read-buffer split into
/// reserved/current-message/pending/free regions, but expressed as a plain growable `Vec<u8>`
/// cursor rather than hand-rolled buffer partitioning, since Rust's `Vec` + `split_off` gives
/// us that for free.
///
/// Sequence-number validation is driven by the single [`SeqCounter`] the caller passes into
/// [`Self::try_take_message`] — the same counter [`write_frames`] advances on the write side —
/// rather than by a second, independently-tracked expectation here. A connection's sequence
/// number is one value shared by both directions (spec §3): the server's reply continues
/// wherever the client's last write left off, so the reader has to see every write's advance
/// too, not just its own reads.
pub struct MessageReader {
    pending: Vec<u8>,
    max_buffer_size: usize,
    in_progress: Option<InProgress>,
}

struct InProgress {
    payload: Vec<u8>,
    first_seqnum: u8,
    expected_first_seqnum: u8,
    seqnum_mismatch: bool,
}

impl MessageReader {
    pub fn new(initial_capacity: usize, max_buffer_size: usize) -> Self {
        MessageReader {
            pending: Vec::with_capacity(initial_capacity),
            max_buffer_size,
            in_progress: None,
        }
    }

    /// Appends freshly-read bytes from the socket to the pending region.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if self.pending.len() + bytes.len() > self.max_buffer_size {
            return Err(Error::MaxBufferSizeExceeded {
                size: self.pending.len() + bytes.len(),
                max: self.max_buffer_size,
            });
        }
        self.pending.extend_from_slice(bytes);
        Ok(())
    }

    /// Attempts to advance the reassembly state machine as far as currently-pending bytes
    /// allow, returning a completed [`Message`] if one is ready. `seq` is advanced past every
    /// frame consumed, matching or not matching its prior value.
    pub fn try_take_message(&mut self, seq: &mut SeqCounter) -> Result<Option<Message>, Error> {
        loop {
            let Some((len, wire_seq)) = read_header(&self.pending) else {
                return Ok(None);
            };
            if self.pending.len() < HEADER_LEN + len {
                return Ok(None);
            }

            let frame_total = HEADER_LEN + len;
            let mut frame = self.pending.split_off(0);
            let remainder = frame.split_off(frame_total);
            let body = frame.split_off(HEADER_LEN);
            self.pending = remainder;

            let expected = seq.0;
            let mismatch = expected != wire_seq;
            seq.0 = wire_seq.wrapping_add(1);

            let is_final = len < MAX_FRAME_PAYLOAD;

            match self.in_progress.take() {
                None => {
                    if is_final {
                        return Ok(Some(Message {
                            payload: body,
                            first_seqnum: wire_seq,
                            last_seqnum: wire_seq,
                            seqnum_mismatch: mismatch,
                            expected_first_seqnum: expected,
                        }));
                    }
                    self.in_progress = Some(InProgress {
                        payload: body,
                        first_seqnum: wire_seq,
                        expected_first_seqnum: expected,
                        seqnum_mismatch: mismatch,
                    });
                }
                Some(mut accum) => {
                    accum.payload.extend_from_slice(&body);
                    accum.seqnum_mismatch |= mismatch;
                    if is_final {
                        return Ok(Some(Message {
                            payload: accum.payload,
                            first_seqnum: accum.first_seqnum,
                            last_seqnum: wire_seq,
                            seqnum_mismatch: accum.seqnum_mismatch,
                            expected_first_seqnum: accum.expected_first_seqnum,
                        }));
                    }
                    self.in_progress = Some(accum);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(payload: &[u8], start_seq: u8) -> Message {
        let mut seq = SeqCounter(start_seq);
        let mut wire = Vec::new();
        write_frames(payload, &mut seq, &mut wire);

        // Simulates the stream's single shared counter already having advanced to `start_seq`
        // via a prior write, the way `MySqlStream` threads one `SeqCounter` through both sides.
        let mut tracking = SeqCounter(start_seq);
        let mut reader = MessageReader::new(16, DEFAULT_MAX_BUFFER_SIZE);
        reader.feed(&wire).unwrap();
        reader
            .try_take_message(&mut tracking)
            .unwrap()
            .expect("one message")
    }

    #[test]
    fn frame_round_trip_small_payload() {
        let payload = b"hello sqlx-like world".to_vec();
        let msg = reassemble(&payload, 5);
        assert_eq!(msg.payload, payload);
        assert_eq!(msg.first_seqnum, 5);
        assert_eq!(msg.last_seqnum, 5);
        assert!(!msg.seqnum_mismatch);
    }

    #[test]
    fn large_frame_boundary_produces_two_frames() {
        let payload = vec![0xAB; MAX_FRAME_PAYLOAD];
        let mut seq = SeqCounter(0);
        let mut wire = Vec::new();
        write_frames(&payload, &mut seq, &mut wire);

        // data frame + empty trailer frame
        assert_eq!(wire.len(), HEADER_LEN + MAX_FRAME_PAYLOAD + HEADER_LEN);
        assert_eq!(seq.0, 2);

        let mut tracking = SeqCounter(0);
        let mut reader = MessageReader::new(16, DEFAULT_MAX_BUFFER_SIZE + 16);
        reader.feed(&wire).unwrap();
        let msg = reader.try_take_message(&mut tracking).unwrap().unwrap();
        assert_eq!(msg.payload.len(), MAX_FRAME_PAYLOAD);
        assert_eq!(msg.first_seqnum, 0);
        assert_eq!(msg.last_seqnum, 1);
    }

    #[test]
    fn sequence_wraps_at_0xff() {
        let payload = vec![0u8; MAX_FRAME_PAYLOAD + 10];
        let msg = reassemble(&payload, 0xFF);
        assert_eq!(msg.first_seqnum, 0xFF);
        assert_eq!(msg.last_seqnum, 0x00);
        assert!(!msg.seqnum_mismatch);
    }

    #[test]
    fn detects_sequence_mismatch_across_messages() {
        let mut reader = MessageReader::new(16, DEFAULT_MAX_BUFFER_SIZE);
        let mut tracking = SeqCounter(0);

        let mut seq = SeqCounter(0);
        let mut wire = Vec::new();
        write_frames(b"first", &mut seq, &mut wire);
        reader.feed(&wire).unwrap();
        let first = reader.try_take_message(&mut tracking).unwrap().unwrap();
        assert!(!first.seqnum_mismatch);
        assert_eq!(tracking.0, 1);

        // Skip a sequence number on purpose.
        let mut bad_wire = Vec::new();
        bad_wire.extend_from_slice(&2u32.to_le_bytes()[..3]);
        bad_wire.push(9); // should have been 1
        bad_wire.extend_from_slice(b"hi");
        reader.feed(&bad_wire).unwrap();
        let second = reader.try_take_message(&mut tracking).unwrap().unwrap();
        assert!(second.seqnum_mismatch);
        assert_eq!(second.expected_first_seqnum, 1);
    }

    #[test]
    fn a_write_advancing_the_shared_counter_is_honored_by_the_next_read() {
        // Mirrors establish(): the reader observes seq=0, then an intervening write (not
        // through this reader at all) advances the shared counter to 2, and the following
        // read at seq=2 must NOT be flagged as a mismatch.
        let mut reader = MessageReader::new(16, DEFAULT_MAX_BUFFER_SIZE);
        let mut shared = SeqCounter(0);

        let mut wire = Vec::new();
        write_frames(b"initial handshake", &mut SeqCounter(0), &mut wire);
        reader.feed(&wire).unwrap();
        let handshake = reader.try_take_message(&mut shared).unwrap().unwrap();
        assert!(!handshake.seqnum_mismatch);
        assert_eq!(shared.0, 1);

        // A write (handshake response) continues the shared counter to 2, exactly like
        // `MySqlStream::write_message` does.
        let mut response_wire = Vec::new();
        write_frames(b"handshake response", &mut shared, &mut response_wire);
        assert_eq!(shared.0, 2);

        let mut reply_wire = Vec::new();
        write_frames(b"ok", &mut SeqCounter(2), &mut reply_wire);
        reader.feed(&reply_wire).unwrap();
        let reply = reader.try_take_message(&mut shared).unwrap().unwrap();
        assert!(!reply.seqnum_mismatch);
    }

    #[test]
    fn empty_payload_still_emits_one_frame() {
        let mut seq = SeqCounter(0);
        let mut wire = Vec::new();
        write_frames(b"", &mut seq, &mut wire);
        assert_eq!(wire.len(), HEADER_LEN);
        assert_eq!(seq.0, 1);
    }

    #[test]
    fn feed_beyond_max_buffer_size_errors() {
        let mut reader = MessageReader::new(4, 8);
        assert!(matches!(
            reader.feed(&[0u8; 16]),
            Err(Error::MaxBufferSizeExceeded { .. })
        ));
    }
}
