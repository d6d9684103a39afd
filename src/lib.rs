//! Keel - a minimal streaming HTTP/1.1 server
//!
//! Core library: incremental request parsing, the per-connection loop,
//! exact-path dispatch and the TCP listener.

pub mod config;
pub mod http;
pub mod router;
pub mod server;
