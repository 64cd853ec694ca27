//! HTTP layer
//!
//! Request descriptors, raw responses, the transport traits the clients are
//! written against, and the `reqwest` implementations of those traits.

pub use request::{ApiRequest, TokenPlacement, parse_header};
pub(crate) use request::serialize_body;
pub use response::RawResponse;
#[cfg(feature = "blocking")]
pub use session::BlockingReqwestTransport;
pub use session::ReqwestTransport;
pub use transport::{BlockingTransport, Transport};

#[cfg(test)]
pub(crate) use transport::{MockBlockingTransport, MockTransport};

mod request;
mod response;
mod session;
mod transport;

// Re-export HTTP types from the http crate for convenience
pub use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
