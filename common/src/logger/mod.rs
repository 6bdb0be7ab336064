pub mod init;
pub mod trace_id;

pub use init::init_logger;
pub use trace_id::TraceId;

use tracing::{Level, Span};

/// Create a root span for a request / session / job.
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::span!(Level::INFO, "root", name = name, trace_id = %trace_id.as_str())
}

/// Create a child span (inherits the enclosing span's fields automatically).
pub fn child_span(name: &'static str) -> Span {
    tracing::span!(Level::INFO, "child", name = name)
}
