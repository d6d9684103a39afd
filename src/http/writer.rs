use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

/// Renders a response into its exact wire form.
///
/// Status line, one `name: value` line per header, a blank line, the body and
/// finally a trailing blank `\r\n\r\n`.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let body = resp.body().unwrap_or_default();
    let mut buf = Vec::with_capacity(128 + body.len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        resp.version,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in resp.headers() {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf.extend_from_slice(body);
    buf.extend_from_slice(b"\r\n\r\n");

    buf
}

/// Serialized response plus how much of it has reached the socket.
pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.written == self.buffer.len()
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::StatusCode;

    #[test]
    fn serialize_status_line_headers_and_trailer() {
        let mut resp = Response::with_status(StatusCode::Created);
        resp.set_header("X-Id", "7");
        resp.set_body("done");

        let bytes = serialize_response(&resp);

        assert_eq!(
            bytes,
            b"HTTP/1.1 201 Created\r\nX-Id: 7\r\nContent-Length: 4\r\n\r\ndone\r\n\r\n".to_vec()
        );
    }

    #[test]
    fn serialize_without_body() {
        let resp = Response::with_status(StatusCode::NoContent);
        let bytes = serialize_response(&resp);
        assert_eq!(bytes, b"HTTP/1.1 204 No Content\r\n\r\n\r\n\r\n".to_vec());
    }

    #[tokio::test]
    async fn writer_drains_whole_buffer() {
        let resp = Response::ok("hello");
        let mut writer = ResponseWriter::new(&resp);
        let mut out: Vec<u8> = Vec::new();

        writer.write_to_stream(&mut out).await.unwrap();

        assert!(writer.is_finished());
        assert_eq!(out, serialize_response(&resp));
    }
}
