//! Streamed response framing.
//!
//! Streamed responses arrive as newline-delimited JSON frames, each
//! optionally prefixed with `data: `, and end with a `[DONE]` sentinel:
//! ```text
//! data: {"choices": [{"text": "He"}]}
//!
//! data: {"choices": [{"text": "llo"}]}
//!
//! data: [DONE]
//! ```
//! Physical chunks from the connection do not line up with frames, so
//! bytes are buffered until a full line is available.

use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;

use crate::client::ClientError;

const DONE_MARKER: &str = "[DONE]";

/// Incremental frame splitter.
///
/// Feed it raw chunks with [`push`](FrameBuffer::push) and collect the
/// complete frames; call [`finish`](FrameBuffer::finish) once the
/// connection closes to flush a trailing unterminated line.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pending: Vec<u8>,
    saw_done: bool,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen.
    pub fn saw_done(&self) -> bool {
        self.saw_done
    }

    /// Append a physical chunk and return every frame completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, ClientError> {
        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.accept_line(&line, &mut frames)?;
        }
        Ok(frames)
    }

    /// Flush the unterminated tail once the byte stream has ended.
    ///
    /// Check [`saw_done`](FrameBuffer::saw_done) afterwards to tell a
    /// complete stream from a truncated one.
    pub fn finish(&mut self) -> Result<Vec<String>, ClientError> {
        let line = std::mem::take(&mut self.pending);
        let mut frames = Vec::new();
        self.accept_line(&line, &mut frames)?;
        Ok(frames)
    }

    fn accept_line(&mut self, line: &[u8], frames: &mut Vec<String>) -> Result<(), ClientError> {
        let line = std::str::from_utf8(line)
            .map_err(|e| ClientError::Stream(format!("invalid UTF-8 in frame: {}", e)))?;

        let Some(frame) = parse_frame(line) else {
            return Ok(());
        };

        if is_done_marker(frame) {
            self.saw_done = true;
        } else {
            frames.push(frame.to_string());
        }
        Ok(())
    }
}

/// Extract the frame payload from a raw line.
///
/// Strips an optional `data:` prefix and surrounding whitespace. Blank
/// lines and SSE comment lines (starting with `:`) yield `None`.
///
/// # Example
/// ```
/// use openai_session::sse::parse_frame;
///
/// assert_eq!(parse_frame("data: {\"a\":1}\r\n"), Some("{\"a\":1}"));
/// assert_eq!(parse_frame("{\"a\":1}"), Some("{\"a\":1}"));
/// assert_eq!(parse_frame("   "), None);
/// ```
pub fn parse_frame(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.starts_with(':') {
        return None;
    }

    let frame = line.strip_prefix("data:").map_or(line, str::trim);
    (!frame.is_empty()).then_some(frame)
}

/// Check if a frame is the end-of-stream sentinel.
///
/// # Example
/// ```
/// use openai_session::sse::is_done_marker;
///
/// assert!(is_done_marker("[DONE]"));
/// assert!(!is_done_marker("{\"data\": \"value\"}"));
/// ```
pub fn is_done_marker(frame: &str) -> bool {
    frame == DONE_MARKER
}

/// Extension trait for `reqwest::Response` to read it as a frame stream.
pub trait FrameResponseExt {
    /// Convert the response body into a stream of raw JSON frames.
    ///
    /// Sentinel and blank frames are dropped. The stream ends with
    /// `Err(StreamTruncated)` if the connection closes before `[DONE]`, and
    /// with `Err(Stream(_))` if the transport fails mid-body.
    fn frames(self) -> impl Stream<Item = Result<String, ClientError>> + Send;
}

impl FrameResponseExt for reqwest::Response {
    fn frames(self) -> impl Stream<Item = Result<String, ClientError>> + Send {
        frames_from_bytes(self.bytes_stream())
    }
}

/// Frame any byte stream. Split out from the response extension so the
/// framing can be driven without a live connection.
pub fn frames_from_bytes<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, ClientError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    stream::unfold(
        (
            Box::pin(bytes),
            FrameBuffer::new(),
            VecDeque::<Result<String, ClientError>>::new(),
            false,
        ),
        |(mut bytes, mut buffer, mut ready, mut ended)| async move {
            loop {
                if let Some(item) = ready.pop_front() {
                    return Some((item, (bytes, buffer, ready, ended)));
                }

                if ended {
                    return None;
                }

                match bytes.next().await {
                    Some(Ok(chunk)) => match buffer.push(chunk.as_ref()) {
                        Ok(frames) => ready.extend(frames.into_iter().map(Ok)),
                        Err(e) => {
                            ended = true;
                            ready.push_back(Err(e));
                        }
                    },
                    Some(Err(e)) => {
                        ended = true;
                        ready.push_back(Err(ClientError::Stream(e.to_string())));
                    }
                    None => {
                        ended = true;
                        match buffer.finish() {
                            Ok(frames) => {
                                ready.extend(frames.into_iter().map(Ok));
                                if !buffer.saw_done() {
                                    ready.push_back(Err(ClientError::StreamTruncated));
                                }
                            }
                            Err(e) => ready.push_back(Err(e)),
                        }
                    }
                }
            }
        },
    )
}
