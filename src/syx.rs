//! Sysex stream plumbing: splitting files into messages, dividing messages
//! into transmit-sized fragments and putting received fragments back
//! together.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::codec::{Codec, Decoded};
use crate::error::DecodeError;

/// Start of exclusive
pub const SYSEX_START: u8 = 0xF0;
/// End of exclusive
pub const SYSEX_END: u8 = 0xF7;

/// Smallest fragment size [`divide`] accepts.
pub const MIN_CHUNK: usize = 4;

/// Read a `.syx` file and split it into messages.
pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<Vec<u8>>> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("Failed to read SYSEX file '{}'", path.display()))?;
    let messages = split(&data).with_context(|| format!("Malformed SYSEX file '{}'", path.display()))?;
    Ok(messages.into_iter().map(<[u8]>::to_vec).collect())
}

/// Split a byte stream into complete `F0 .. F7` messages.
///
/// Bytes outside a message (running status, padding) are skipped. A
/// message that never terminates is an error.
pub fn split(data: &[u8]) -> Result<Vec<&[u8]>> {
    if data.is_empty() {
        return Err(anyhow!("Empty SYSEX data"));
    }

    let mut messages = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        while pos < data.len() && data[pos] != SYSEX_START {
            pos += 1;
        }
        if pos >= data.len() {
            break;
        }

        let start = pos;
        pos += 1;
        while pos < data.len() && data[pos] != SYSEX_END {
            pos += 1;
        }
        if pos >= data.len() {
            return Err(anyhow!("Unterminated SYSEX message at byte {}", start));
        }

        pos += 1;
        messages.push(&data[start..pos]);
    }

    log::debug!("SYSEX: split {} bytes into {} messages", data.len(), messages.len());
    Ok(messages)
}

/// Cut `sysex` into fragments of at most `chunk_size` bytes for devices
/// with small receive buffers.
///
/// Some MIDI stacks reject a bare terminator, so a one-byte tail is avoided
/// by moving a byte from the second-to-last fragment into the last one.
pub fn divide(sysex: &[u8], chunk_size: usize) -> Result<Vec<&[u8]>> {
    if chunk_size < MIN_CHUNK {
        return Err(anyhow!(
            "Chunk size must be at least {}, was {}",
            MIN_CHUNK,
            chunk_size
        ));
    }
    let mut fragments: Vec<&[u8]> = sysex.chunks(chunk_size).collect();
    let n = fragments.len();
    if n > 1 && fragments[n - 1].len() == 1 {
        let tail = sysex.len() - 2;
        fragments[n - 2] = &sysex[(n - 2) * chunk_size..tail];
        fragments[n - 1] = &sysex[tail..];
    }
    log::debug!("SYSEX: divided {} bytes into {} fragments", sysex.len(), n);
    Ok(fragments)
}

/// Collects fragments of one sysex message and decodes it once the
/// terminator arrives.
pub struct Reassembler<'a> {
    codec: &'a dyn Codec,
    buf: Vec<u8>,
}

impl<'a> Reassembler<'a> {
    /// Reassemble messages for `codec`.
    pub fn new(codec: &'a dyn Codec) -> Self {
        Self {
            codec,
            buf: Vec::new(),
        }
    }

    /// Bytes received so far for the current message.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Add a fragment. Returns [`Decoded::Incomplete`] until a fragment
    /// ending in `F7` completes the message, then the codec's decode result.
    pub fn push(&mut self, fragment: &[u8]) -> Decoded {
        if self.buf.is_empty() && fragment.first() != Some(&SYSEX_START) {
            return Decoded::Failed(DecodeError::BadHeader("sysex"));
        }
        self.buf.extend_from_slice(fragment);
        if self.buf.last() != Some(&SYSEX_END) {
            log::debug!("SYSEX: holding {} bytes", self.buf.len());
            return Decoded::Incomplete;
        }

        let message = std::mem::take(&mut self.buf);
        self.codec.decode(&message)
    }
}
