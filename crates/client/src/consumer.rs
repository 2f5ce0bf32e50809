//! Client Stream Consumer.
//!
//! Turns the chat endpoint's NDJSON byte stream into a growing answer.
//! Bytes are decoded with [`Utf8StreamDecoder`], split on `\n`, and each
//! complete line is parsed as a [`WireChunk`]. The incomplete trailing line
//! of a read is buffered until the next read completes it, so the final
//! text is the same wherever the read boundaries fall. Complete lines that
//! fail to parse are discarded.
//!
//! After every chunk carrying a `response` the accumulated text is handed
//! to the update callback in full; callers re-render from scratch.

use futures::{Stream, StreamExt};
use relaydesk_core::protocol::WireChunk;
use std::pin::pin;
use tracing::trace;

use crate::decoder::Utf8StreamDecoder;
use crate::linkify;

#[derive(Default)]
pub struct StreamConsumer {
    decoder: Utf8StreamDecoder,
    pending: String,
    text: String,
    chunks: usize,
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read. `on_update` sees the accumulated text after each chunk.
    pub fn push(&mut self, bytes: &[u8], on_update: &mut dyn FnMut(&str)) {
        let decoded = self.decoder.decode(bytes);
        self.pending.push_str(&decoded);

        while let Some(newline) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=newline).collect();
            self.accept_line(&line, on_update);
        }
    }

    /// End of stream: flush the decoder and any unterminated last line.
    pub fn finish(mut self, on_update: &mut dyn FnMut(&str)) -> String {
        let tail = std::mem::take(&mut self.decoder).finish();
        self.pending.push_str(&tail);

        let last = std::mem::take(&mut self.pending);
        self.accept_line(&last, on_update);
        self.text
    }

    /// Accumulated answer text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of chunks accepted so far.
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Accumulated answer as safe markup.
    pub fn render(&self) -> String {
        linkify::render(&self.text)
    }

    fn accept_line(&mut self, line: &str, on_update: &mut dyn FnMut(&str)) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        match serde_json::from_str::<WireChunk>(line) {
            Ok(WireChunk {
                response: Some(fragment),
            }) => {
                self.text.push_str(&fragment);
                self.chunks += 1;
                on_update(&self.text);
            }
            Ok(_) => {}
            Err(e) => trace!(error = %e, line_len = line.len(), "Discarding unparseable stream line"),
        }
    }
}

/// Drain a byte stream to completion and return the full answer.
///
/// A transport error ends consumption and is returned; text already shown
/// through `on_update` stays shown.
pub async fn consume<S, B, E>(stream: S, mut on_update: impl FnMut(&str)) -> Result<String, E>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    let mut stream = pin!(stream);
    let mut consumer = StreamConsumer::new();

    while let Some(block) = stream.next().await {
        let block = block?;
        consumer.push(block.as_ref(), &mut on_update);
    }

    Ok(consumer.finish(&mut on_update))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn feed(reads: &[&[u8]]) -> (String, Vec<String>) {
        let mut snapshots = Vec::new();
        let mut consumer = StreamConsumer::new();
        let mut record = |text: &str| snapshots.push(text.to_string());
        for read in reads {
            consumer.push(read, &mut record);
        }
        let text = consumer.finish(&mut record);
        (text, snapshots)
    }

    #[test]
    fn one_line_per_read() {
        let (text, snapshots) = feed(&[b"{\"response\":\"Hel\"}\n", b"{\"response\":\"lo\"}\n"]);
        assert_eq!(text, "Hello");
        assert_eq!(snapshots, vec!["Hel", "Hello"]);
    }

    #[test]
    fn line_split_mid_object() {
        let mut consumer = StreamConsumer::new();
        let mut snapshots: Vec<String> = Vec::new();
        let mut record = |text: &str| snapshots.push(text.to_string());

        consumer.push(br#"{"response":"Hel"#, &mut record);
        assert_eq!(consumer.text(), "");

        consumer.push(b"lo\"}\n", &mut record);
        assert_eq!(consumer.text(), "Hello");

        let text = consumer.finish(&mut record);
        assert_eq!(text, "Hello");
        assert_eq!(snapshots, vec!["Hello"]);
    }

    #[test]
    fn several_lines_in_one_read() {
        let (text, snapshots) = feed(&[b"{\"response\":\"a\"}\n{\"response\":\"b\"}\n{\"response\":\"c\"}\n"]);
        assert_eq!(text, "abc");
        assert_eq!(snapshots.len(), 3);
    }

    #[test]
    fn unterminated_last_line_is_flushed() {
        let (text, _) = feed(&[b"{\"response\":\"a\"}\n{\"response\":\"b\"}"]);
        assert_eq!(text, "ab");
    }

    #[test]
    fn converges_under_any_split() {
        let body = "{\"response\":\"Caf\u{e9} \"}\n{\"response\":\"\u{2615} ok\"}\n".as_bytes();
        for cut in 0..=body.len() {
            let (text, _) = feed(&[&body[..cut], &body[cut..]]);
            assert_eq!(text, "Caf\u{e9} \u{2615} ok", "split at byte {cut}");
        }
    }

    #[test]
    fn garbage_and_extra_fields() {
        let (text, snapshots) = feed(&[
            b"not json\n",
            b"{\"response\":\"x\",\"done\":false}\n",
            b"\n",
            b"{\"done\":true}\n",
            b"[1,2]\r\n",
        ]);
        assert_eq!(text, "x");
        assert_eq!(snapshots, vec!["x"]);
    }

    #[test]
    fn render_escapes_accumulated_text() {
        let mut consumer = StreamConsumer::new();
        consumer.push(b"{\"response\":\"<b>see</b> www.acme.example.test\"}\n", &mut |_| {});
        let html = consumer.render();
        assert!(html.starts_with("&lt;b&gt;see&lt;/b&gt; <a href=\"https://www.acme.example.test\""));
        assert_eq!(consumer.chunks(), 1);
    }

    #[tokio::test]
    async fn consume_stream_to_end() {
        let reads: Vec<Result<&[u8], Infallible>> = vec![
            Ok(br#"{"response":"Hel"#.as_slice()),
            Ok(b"lo\"}\n{\"response\":\", world\"}\n".as_slice()),
        ];
        let mut updates = 0;
        let text = consume(futures::stream::iter(reads), |_| updates += 1)
            .await
            .unwrap();
        assert_eq!(text, "Hello, world");
        assert_eq!(updates, 2);
    }

    #[tokio::test]
    async fn consume_stops_on_transport_error() {
        let reads: Vec<Result<&[u8], &str>> = vec![
            Ok(b"{\"response\":\"partial\"}\n".as_slice()),
            Err("connection reset"),
            Ok(b"{\"response\":\"never\"}\n".as_slice()),
        ];
        let mut last = String::new();
        let err = consume(futures::stream::iter(reads), |t| last = t.to_string())
            .await
            .unwrap_err();
        assert_eq!(err, "connection reset");
        assert_eq!(last, "partial");
    }
}
