//! Decoder for the streamed refinement body
//!
//! The body is a plain byte stream carrying newline-delimited frames. Frames
//! that start with `data: ` hold a JSON object whose optional `chunk` field is
//! the next piece of text. Everything else is ignored, and a frame whose JSON
//! does not parse is dropped without ending the stream.
//!
//! Bytes are buffered until a newline arrives, so frames (and multi-byte
//! characters) split across network chunks decode intact.

use std::collections::VecDeque;
use std::pin::pin;

use futures::{Stream, StreamExt, future};
use serde::Deserialize;

use super::backend::ByteStream;
use super::error::ApiError;

/// Prefix marking a significant frame
pub const DATA_PREFIX: &str = "data: ";

/// Splits raw bytes into lines, holding back any incomplete trailing line
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(end) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Flush whatever is left once the byte stream has ended
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    chunk: Option<String>,
}

/// Extract the chunk text from one frame, if it carries any
pub fn parse_frame(line: &str) -> Option<String> {
    let data = line.strip_prefix(DATA_PREFIX)?;
    match serde_json::from_str::<ChunkPayload>(data) {
        Ok(payload) => payload.chunk,
        Err(e) => {
            log::debug!("Skipping malformed frame ({}): {}", e, data);
            None
        }
    }
}

struct FrameState {
    bytes: ByteStream,
    decoder: LineDecoder,
    ready: VecDeque<String>,
    finished: bool,
}

/// Lazily decode a byte stream into frames (lines), in arrival order.
///
/// Ends when the byte stream ends. A transport error is yielded once and
/// ends the sequence.
pub fn frames(bytes: ByteStream) -> impl Stream<Item = Result<String, ApiError>> {
    let state = FrameState {
        bytes,
        decoder: LineDecoder::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.ready.pop_front() {
                return Some((Ok(line), state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let lines = state.decoder.push(&chunk);
                    state.ready.extend(lines);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.finished = true;
                    let rest = state.decoder.finish();
                    state.ready.extend(rest);
                }
            }
        }
    })
}

/// Chunk texts carried by the stream, in arrival order
pub fn chunks(bytes: ByteStream) -> impl Stream<Item = Result<String, ApiError>> {
    frames(bytes).filter_map(|frame| {
        future::ready(match frame {
            Ok(line) => parse_frame(&line).map(Ok),
            Err(e) => Some(Err(e)),
        })
    })
}

/// Drain the stream, concatenating every chunk
pub async fn accumulate(bytes: ByteStream) -> Result<String, ApiError> {
    let mut chunks = pin!(chunks(bytes));
    let mut content = String::new();
    while let Some(chunk) = chunks.next().await {
        content.push_str(&chunk?);
    }
    Ok(content)
}
