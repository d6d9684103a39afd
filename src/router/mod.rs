//! Request dispatch.
//!
//! Routes are registered once at startup by exact path and looked up with the
//! request's path (query string stripped). The table is shared read-only
//! between connection tasks behind an `Arc`.

pub mod dispatcher;

pub use dispatcher::{ConfigurationError, Handler, Router};
