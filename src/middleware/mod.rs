pub mod context;
pub mod redact;
pub mod response_headers;
