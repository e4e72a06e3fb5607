//! Blob payloads, either fully buffered or streamed from the registry
use std::fmt;

use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use tracing::trace;

use crate::errors::{RegistryError, Result};
use crate::response::Attach;

/// Stream response of a blob with optional content length if available
pub struct SizedStream {
    /// The length of the stream if the upstream registry sent a `Content-Length` header
    pub content_length: Option<u64>,
    /// The stream of bytes
    pub stream: BoxStream<'static, std::result::Result<Bytes, std::io::Error>>,
}

enum Content {
    Buffered(Bytes),
    Streamed(SizedStream),
}

/// The binary payload of a blob.
///
/// A blob is either buffered, when the whole body was read, or streamed, in
/// which case it holds the open response until [`Blob::iter_bytes`] has been
/// drained or dropped.
pub struct Blob {
    content: Content,
}

impl Blob {
    /// Chunk size used when callers have no preference
    pub const DEFAULT_CHUNK_SIZE: usize = 1024;

    /// A blob whose content is already in memory
    pub fn buffered(content: impl Into<Bytes>) -> Self {
        Self {
            content: Content::Buffered(content.into()),
        }
    }

    /// A blob backed by a live stream
    pub fn streamed(stream: SizedStream) -> Self {
        Self {
            content: Content::Streamed(stream),
        }
    }

    /// A blob backed by any stream of bytes
    pub fn from_stream<S>(stream: S, content_length: Option<u64>) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, std::io::Error>> + Send + 'static,
    {
        Self::streamed(SizedStream {
            content_length,
            stream: stream.boxed(),
        })
    }

    /// Whether the blob is in streaming mode
    pub fn is_streamed(&self) -> bool {
        matches!(self.content, Content::Streamed(_))
    }

    /// The size of the content, when known
    pub fn content_length(&self) -> Option<u64> {
        match &self.content {
            Content::Buffered(bytes) => Some(bytes.len() as u64),
            Content::Streamed(stream) => stream.content_length,
        }
    }

    /// The whole content of a buffered blob.
    ///
    /// Fails with [`RegistryError::Unreadable`] in streaming mode: streaming exists
    /// so that large layers are never loaded in memory at once.
    pub fn content(&self) -> Result<&Bytes> {
        match &self.content {
            Content::Buffered(bytes) => Ok(bytes),
            Content::Streamed(_) => Err(RegistryError::Unreadable),
        }
    }

    /// Consume the blob as a stream of chunks of at most `chunk_size` bytes.
    ///
    /// In streaming mode the underlying response is released as soon as it is
    /// exhausted or fails, and in any case when the returned stream is dropped.
    pub fn iter_bytes(
        self,
        chunk_size: usize,
    ) -> BoxStream<'static, std::result::Result<Bytes, std::io::Error>> {
        let chunk_size = chunk_size.max(1);
        match self.content {
            Content::Buffered(bytes) => {
                let chunks: Vec<_> = (0..bytes.len())
                    .step_by(chunk_size)
                    .map(|start| Ok(bytes.slice(start..(start + chunk_size).min(bytes.len()))))
                    .collect();
                stream::iter(chunks).boxed()
            }
            Content::Streamed(sized) => rechunk(sized.stream, chunk_size).boxed(),
        }
    }
}

struct Rechunker {
    source: Option<BoxStream<'static, std::result::Result<Bytes, std::io::Error>>>,
    buffer: BytesMut,
    chunk_size: usize,
}

impl Rechunker {
    fn release(&mut self) {
        if self.source.take().is_some() {
            trace!("Released blob stream");
        }
    }
}

fn rechunk(
    source: BoxStream<'static, std::result::Result<Bytes, std::io::Error>>,
    chunk_size: usize,
) -> impl Stream<Item = std::result::Result<Bytes, std::io::Error>> + Send {
    let state = Rechunker {
        source: Some(source),
        buffer: BytesMut::new(),
        chunk_size,
    };
    stream::unfold(state, |mut state| async move {
        loop {
            if state.buffer.len() >= state.chunk_size {
                let chunk = state.buffer.split_to(state.chunk_size).freeze();
                return Some((Ok(chunk), state));
            }
            let Some(source) = state.source.as_mut() else {
                if state.buffer.is_empty() {
                    return None;
                }
                let chunk = state.buffer.split().freeze();
                return Some((Ok(chunk), state));
            };
            match source.next().await {
                Some(Ok(bytes)) => state.buffer.extend_from_slice(&bytes),
                Some(Err(e)) => {
                    state.release();
                    state.buffer.clear();
                    return Some((Err(e), state));
                }
                None => state.release(),
            }
        }
    })
}

impl Attach for Blob {}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.content {
            Content::Buffered(bytes) => f
                .debug_struct("Blob")
                .field("content", &format_args!("{} bytes", bytes.len()))
                .finish(),
            Content::Streamed(stream) => f
                .debug_struct("Blob")
                .field("streamed", &true)
                .field("content_length", &stream.content_length)
                .finish(),
        }
    }
}
