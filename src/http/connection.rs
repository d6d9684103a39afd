use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace, warn};

use crate::config::ServerConfig;
use crate::http::parser::{ParseState, RequestParser};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::source::{ByteSource, DEFAULT_CHUNK_SIZE};
use crate::http::writer::ResponseWriter;
use crate::router::Router;

/// Per-connection knobs taken from the server configuration.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub read_buffer_size: usize,
    pub idle_timeout: Option<Duration>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_CHUNK_SIZE,
            idle_timeout: None,
        }
    }
}

impl From<&ServerConfig> for ConnectionSettings {
    fn from(cfg: &ServerConfig) -> Self {
        Self {
            read_buffer_size: cfg.read_buffer_size,
            idle_timeout: cfg.idle_timeout(),
        }
    }
}

pub struct Connection<S> {
    source: ByteSource<S>,
    // bytes read past the end of the last request
    leftover: BytesMut,
    router: Arc<Router>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, router: Arc<Router>) -> Self {
        Self::with_settings(stream, router, ConnectionSettings::default())
    }

    pub fn with_settings(stream: S, router: Arc<Router>, settings: ConnectionSettings) -> Self {
        let source = ByteSource::with_chunk_size(stream, settings.read_buffer_size)
            .idle_timeout(settings.idle_timeout);

        Self {
            source,
            leftover: BytesMut::new(),
            router,
            state: ConnectionState::Reading,
        }
    }

    /// Serves requests until the peer closes, asks to close, or fails.
    ///
    /// Read, write and parse failures end the connection and are returned;
    /// a parse failure first gets a best-effort 500 reply.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => match self.read_request().await? {
                    Some(req) => {
                        self.state = ConnectionState::Processing(req);
                    }
                    None => {
                        self.state = ConnectionState::Closed;
                    }
                },

                ConnectionState::Processing(req) => {
                    let response = self.router.dispatch(req);
                    let keep_alive = req.keep_alive();

                    debug!(
                        method = %req.method,
                        path = %req.path(),
                        status = response.status.as_u16(),
                        keep_alive,
                        "Request handled"
                    );

                    let writer = ResponseWriter::new(&response);
                    self.state = ConnectionState::Writing(writer, keep_alive);
                }

                ConnectionState::Writing(writer, keep_alive) => {
                    writer.write_to_stream(self.source.get_mut()).await?;

                    if *keep_alive {
                        self.state = ConnectionState::Reading; // go back for next request
                    } else {
                        self.state = ConnectionState::Closed;
                    }
                }

                ConnectionState::Closed => {
                    // peer may already be gone
                    let _ = self.source.get_mut().shutdown().await;
                    break;
                }
            }
        }

        Ok(())
    }

    /// Reads one full request, starting from any bytes left by the previous one.
    ///
    /// Returns `Ok(None)` when the peer closes the stream.
    pub async fn read_request(&mut self) -> anyhow::Result<Option<Request>> {
        let mut parser = RequestParser::with_buffer(std::mem::take(&mut self.leftover));

        loop {
            match parser.parse() {
                Ok(Some(request)) => {
                    self.leftover = parser.into_remainder();
                    trace!(
                        target_path = %request.target,
                        version = %request.version,
                        headers = ?request.headers,
                        body_len = request.body.len(),
                        "Parsed request"
                    );
                    return Ok(Some(request));
                }

                Ok(None) => {
                    // Need more data → fall through to read
                }

                Err(e) => {
                    warn!(error = %e, "Rejecting malformed request");
                    self.reject().await;
                    self.state = ConnectionState::Closed;
                    return Err(e.into());
                }
            }

            match self.source.read().await? {
                Some(chunk) => parser.feed(&chunk),
                None => {
                    if parser.state() != ParseState::RequestLine || parser.buffered() > 0 {
                        debug!(
                            state = ?parser.state(),
                            buffered = parser.buffered(),
                            "Peer closed mid-request, discarding partial request"
                        );
                    }
                    return Ok(None);
                }
            }
        }
    }

    async fn reject(&mut self) {
        let mut writer = ResponseWriter::new(&Response::internal_error());
        if let Err(e) = writer.write_to_stream(self.source.get_mut()).await {
            debug!(error = %e, "Could not deliver error response");
        }
    }

    pub fn into_inner(self) -> S {
        self.source.into_inner()
    }
}
