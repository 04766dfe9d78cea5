//! Line buffering over raw byte chunks.

/// Reassembles newline-delimited records from a sequence of byte chunks.
///
/// Chunks may split a record at any byte, including inside a multi-byte
/// UTF-8 sequence. The decoder buffers the unterminated tail at the byte
/// level and splits on `b'\n'` before decoding, so a code point split
/// across two chunks is always decoded intact (a `\n` byte never occurs
/// inside a multi-byte sequence).
#[derive(Debug, Default)]
pub struct LineDecoder {
    unfinished: Vec<u8>,
}

impl LineDecoder {
    /// Creates a decoder with an empty carry-over buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every record completed by it.
    ///
    /// All `\n`-terminated lines in `unfinished + chunk` are drained and
    /// returned, in order, without their terminator; the remainder becomes
    /// the new carry-over.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.unfinished.extend_from_slice(chunk);

        let mut records = Vec::new();
        while let Some(pos) = self.unfinished.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.unfinished.drain(..=pos).collect();
            records.push(String::from_utf8_lossy(&line[..line.len() - 1]).into_owned());
        }
        records
    }

    /// Flushes the carry-over as a final record at end-of-stream.
    ///
    /// A trailing record with no terminating `\n` is treated as complete
    /// once the source reports done. Returns `None` when nothing is held.
    pub fn finish(&mut self) -> Option<String> {
        if self.unfinished.is_empty() {
            return None;
        }
        let tail = std::mem::take(&mut self.unfinished);
        Some(String::from_utf8_lossy(&tail).into_owned())
    }
}
