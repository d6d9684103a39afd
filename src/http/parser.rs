//! Incremental HTTP/1.x request parser.
//!
//! A [`RequestParser`] is fed whatever bytes the socket produced and advances
//! as far as those bytes allow:
//!
//! ```text
//! RequestLine ──line──▶ Headers ──empty line──▶ Body ──Content-Length bytes──▶ Complete
//!                                   │                                            ▲
//!                                   └──── no / invalid Content-Length ───────────┘
//! ```
//!
//! Nothing here blocks or performs IO. One parser builds one request; bytes
//! that arrive after that request ends stay in the buffer and are handed to
//! the next parser through [`RequestParser::into_remainder`].

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tracing::debug;

use crate::http::query::QueryParams;
use crate::http::request::{declared_length, Headers, Method, Request, Version};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed request line: {0}")]
    MalformedRequestLine(&'static str),
}

/// Where the parser is in the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    RequestLine,
    Headers,
    Body { remaining: usize },
    Complete,
}

#[derive(Debug)]
struct RequestLine {
    method: Method,
    target: String,
    version: Version,
}

pub struct RequestParser {
    buffer: BytesMut,
    // bytes of `buffer` already searched for '\n'
    scanned: usize,
    state: ParseState,
    line: Option<RequestLine>,
    headers: Headers,
    body: Vec<u8>,
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestParser {
    pub fn new() -> Self {
        Self::with_buffer(BytesMut::new())
    }

    /// Starts a parser over bytes left behind by the previous request.
    pub fn with_buffer(buffer: BytesMut) -> Self {
        Self {
            buffer,
            scanned: 0,
            state: ParseState::RequestLine,
            line: None,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == ParseState::Complete
    }

    /// Number of bytes buffered but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Gives back the unconsumed bytes, which belong to the next request.
    pub fn into_remainder(self) -> BytesMut {
        self.buffer
    }

    /// Advances with the bytes fed so far.
    ///
    /// Returns `Ok(Some(request))` exactly once, when the request is complete.
    /// `Ok(None)` means more input is needed, or that the request was already
    /// handed out; in the latter case no further bytes are consumed.
    pub fn parse(&mut self) -> Result<Option<Request>, ParseError> {
        loop {
            match self.state {
                ParseState::RequestLine => {
                    let Some(line) = self.next_line() else {
                        return Ok(None);
                    };
                    self.line = Some(parse_request_line(&line)?);
                    self.state = ParseState::Headers;
                }

                ParseState::Headers => {
                    let Some(line) = self.next_line() else {
                        return Ok(None);
                    };

                    if line.is_empty() {
                        self.state = match declared_length(&self.headers) {
                            Some(n) if n > 0 => ParseState::Body { remaining: n },
                            _ => ParseState::Complete,
                        };
                        continue;
                    }

                    self.push_header(&line);
                }

                ParseState::Body { remaining } => {
                    if self.buffer.is_empty() {
                        return Ok(None);
                    }

                    let take = remaining.min(self.buffer.len());
                    let chunk = self.buffer.split_to(take);
                    self.body.extend_from_slice(&chunk);

                    self.state = if take == remaining {
                        ParseState::Complete
                    } else {
                        ParseState::Body {
                            remaining: remaining - take,
                        }
                    };
                }

                ParseState::Complete => return Ok(self.finish()),
            }
        }
    }

    /// Pops the next line off the buffer without its `\n` and optional `\r`.
    ///
    /// When no terminator is buffered yet, remembers how far it looked so the
    /// next call only scans newly fed bytes.
    fn next_line(&mut self) -> Option<Bytes> {
        let found = self.buffer[self.scanned..]
            .iter()
            .position(|&b| b == b'\n');

        let Some(offset) = found else {
            self.scanned = self.buffer.len();
            return None;
        };

        let end = self.scanned + offset;
        let mut line = self.buffer.split_to(end + 1);
        self.scanned = 0;

        line.truncate(end);
        if line.last() == Some(&b'\r') {
            line.truncate(end - 1);
        }

        Some(line.freeze())
    }

    fn push_header(&mut self, line: &[u8]) {
        let text = String::from_utf8_lossy(line);

        let Some((name, value)) = text.split_once(':') else {
            debug!(line = %text, "Ignoring header line without ':'");
            return;
        };

        self.headers.append(name.trim(), value.trim());
    }

    fn finish(&mut self) -> Option<Request> {
        let line = self.line.take()?;
        let query = QueryParams::from_target(&line.target);

        Some(Request {
            method: line.method,
            target: line.target,
            version: line.version,
            headers: std::mem::take(&mut self.headers),
            query,
            body: std::mem::take(&mut self.body),
        })
    }
}

fn parse_request_line(line: &[u8]) -> Result<RequestLine, ParseError> {
    let line = std::str::from_utf8(line)
        .map_err(|_| ParseError::MalformedRequestLine("request line is not valid UTF-8"))?;

    let parts: Vec<&str> = line.split(' ').collect();
    let [method, target, version] = parts[..] else {
        return Err(ParseError::MalformedRequestLine(
            "expected exactly three space-separated tokens",
        ));
    };

    let method = Method::from_str(method)
        .ok_or(ParseError::MalformedRequestLine("unsupported method"))?;

    if !is_valid_target(target) {
        return Err(ParseError::MalformedRequestLine("invalid target path"));
    }

    let version = Version::from_str(version)
        .ok_or(ParseError::MalformedRequestLine("unsupported version"))?;

    Ok(RequestLine {
        method,
        target: target.to_string(),
        version,
    })
}

const FORBIDDEN_TARGET_CHARS: &[char] = &[' ', '{', '}', '|', '\\', '^', '[', ']', '`'];

/// Target must start with `/` and hold no control, space or reserved chars.
pub fn is_valid_target(target: &str) -> bool {
    target.starts_with('/')
        && !target
            .chars()
            .any(|c| c.is_ascii_control() || FORBIDDEN_TARGET_CHARS.contains(&c))
}

/// Parses one request out of a complete buffer.
///
/// Convenience for callers that already hold a whole request; returns `None`
/// when the bytes stop short of a complete request.
pub fn parse_http_request(buf: &[u8]) -> Result<Option<(Request, BytesMut)>, ParseError> {
    let mut parser = RequestParser::new();
    parser.feed(buf);

    match parser.parse()? {
        Some(request) => Ok(Some((request, parser.into_remainder()))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let (parsed, rest) = parse_http_request(req).unwrap().unwrap();

        assert_eq!(parsed.path(), "/");
        assert_eq!(parsed.header("Host"), Some("example.com"));
        assert!(rest.is_empty());
    }

    #[test]
    fn scan_resumes_after_partial_line() {
        let mut parser = RequestParser::new();
        parser.feed(b"GET /a HT");
        assert_eq!(parser.parse().unwrap(), None);
        assert_eq!(parser.scanned, 9);

        parser.feed(b"TP/1.1\r");
        assert_eq!(parser.parse().unwrap(), None);
        assert_eq!(parser.state(), ParseState::RequestLine);

        parser.feed(b"\n");
        assert_eq!(parser.parse().unwrap(), None);
        assert_eq!(parser.state(), ParseState::Headers);
        assert_eq!(parser.scanned, 0);
    }

    #[test]
    fn lf_only_terminators() {
        let (parsed, _) = parse_http_request(b"PUT /x HTTP/1.0\nA: b\n\n")
            .unwrap()
            .unwrap();

        assert_eq!(parsed.method, Method::PUT);
        assert_eq!(parsed.version, Version::Http10);
        assert_eq!(parsed.header("a"), Some("b"));
    }

    #[test]
    fn complete_parser_consumes_nothing_more() {
        let mut parser = RequestParser::new();
        parser.feed(b"GET / HTTP/1.1\r\n\r\n");
        assert!(parser.parse().unwrap().is_some());

        parser.feed(b"GET /next HTTP/1.1\r\n\r\n");
        assert_eq!(parser.parse().unwrap(), None);
        assert!(parser.is_complete());
        assert_eq!(parser.buffered(), 22);
    }

    #[test]
    fn target_validation() {
        assert!(is_valid_target("/"));
        assert!(is_valid_target("/a/b?c=d&e=f"));
        assert!(!is_valid_target("a/b"));
        assert!(!is_valid_target(""));
        assert!(!is_valid_target("/a{b}"));
        assert!(!is_valid_target("/a\tb"));
        assert!(!is_valid_target("/a\x7f"));
    }
}
