//! Streaming UTF-8 decoder.
//!
//! Read boundaries can fall inside a multi-byte character. The decoder keeps
//! the incomplete tail of one read and completes it with the next, so a
//! character is never split or replaced because of where a read ended.

use encoding_rs::{Decoder, UTF_8};

pub struct Utf8StreamDecoder {
    decoder: Decoder,
}

impl Default for Utf8StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder_with_bom_removal(),
        }
    }

    /// Decode one read. Bytes of an unfinished character are held back.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.run(bytes, false)
    }

    /// Flush held-back bytes at end of stream. A truncated character
    /// becomes U+FFFD.
    pub fn finish(mut self) -> String {
        self.run(&[], true)
    }

    fn run(&mut self, bytes: &[u8], last: bool) -> String {
        let capacity = self
            .decoder
            .max_utf8_buffer_length(bytes.len())
            .unwrap_or(bytes.len() * 3 + 4);
        let mut out = String::with_capacity(capacity);
        // Worst-case capacity, so the whole input is always consumed.
        let _ = self.decoder.decode_to_string(bytes, &mut out, last);
        out
    }
}
