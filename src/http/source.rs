//! Byte source feeding the request parser.
//!
//! Wraps any `AsyncRead` and hands out whatever the last read produced. A
//! zero-byte read is reported as end-of-stream; errors are returned as-is and
//! never retried.

use std::io;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

/// Read size used when none is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 512;

pub struct ByteSource<R> {
    reader: R,
    buf: BytesMut,
    chunk_size: usize,
    idle_timeout: Option<Duration>,
}

impl<R> ByteSource<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            reader,
            buf: BytesMut::with_capacity(chunk_size),
            chunk_size,
            idle_timeout: None,
        }
    }

    /// Fails reads with `TimedOut` when no data shows up within `idle`.
    pub fn idle_timeout(mut self, idle: Option<Duration>) -> Self {
        self.idle_timeout = idle;
        self
    }

    /// Reads the next chunk. `Ok(None)` means the peer closed the stream.
    pub async fn read(&mut self) -> io::Result<Option<Bytes>> {
        self.buf.reserve(self.chunk_size);

        let n = match self.idle_timeout {
            Some(idle) => timeout(idle, self.reader.read_buf(&mut self.buf))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "idle read timeout"))??,
            None => self.reader.read_buf(&mut self.buf).await?,
        };

        if n == 0 {
            return Ok(None);
        }

        Ok(Some(self.buf.split().freeze()))
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}
