pub mod cors;
pub mod rate_limit;
pub mod request_trace;

pub use cors::cors_middleware;
pub use request_trace::RequestTrace;
