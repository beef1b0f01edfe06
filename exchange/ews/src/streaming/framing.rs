/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Splitting a hanging response body into the SOAP envelopes it carries.
//!
//! The server writes one complete envelope per batch of notifications, but
//! chunk boundaries fall anywhere; an envelope is only parsed once its end
//! tag has arrived.

const ENVELOPE: &[u8] = b"Envelope";

#[derive(Debug, Default)]
pub(crate) struct EnvelopeSplitter {
    buffer: Vec<u8>,
}

impl EnvelopeSplitter {
    /// Appends a chunk of the body, returning the envelopes it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.buffer.extend_from_slice(chunk);

        let mut envelopes = Vec::new();
        while let Some(end) = find_envelope_end(&self.buffer) {
            let rest = self.buffer.split_off(end);
            let envelope = std::mem::replace(&mut self.buffer, rest);
            envelopes.push(trim_start(envelope));
        }

        envelopes
    }

    /// Whether anything other than whitespace is waiting for more input.
    pub fn has_partial_envelope(&self) -> bool {
        self.buffer.iter().any(|byte| !byte.is_ascii_whitespace())
    }
}

/// Returns the offset just past the first complete `</prefix:Envelope>` tag.
fn find_envelope_end(buffer: &[u8]) -> Option<usize> {
    let mut from = 0;
    while let Some(offset) = buffer[from..].windows(ENVELOPE.len()).position(|window| window == ENVELOPE) {
        let name_start = from + offset;
        let name_end = name_start + ENVELOPE.len();
        from = name_end;

        let mut tag_start = name_start;
        if tag_start > 0 && buffer[tag_start - 1] == b':' {
            tag_start -= 1;
            while tag_start > 0 && is_name_byte(buffer[tag_start - 1]) {
                tag_start -= 1;
            }
        }
        if tag_start < 2 || &buffer[tag_start - 2..tag_start] != b"</" {
            continue;
        }

        let mut tag_end = name_end;
        while tag_end < buffer.len() && buffer[tag_end].is_ascii_whitespace() {
            tag_end += 1;
        }
        match buffer.get(tag_end) {
            Some(b'>') => return Some(tag_end + 1),
            // The rest of the tag hasn't arrived yet.
            None => return None,
            Some(_) => continue,
        }
    }

    None
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.')
}

fn trim_start(mut envelope: Vec<u8>) -> Vec<u8> {
    let leading = envelope
        .iter()
        .take_while(|byte| byte.is_ascii_whitespace())
        .count();
    envelope.drain(..leading);
    envelope
}
