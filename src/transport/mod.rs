//! 传输层模块：共享连接池上的 REST 与 GraphQL 调用。
//!
//! HTTP transport shared by the REST and GraphQL clients. One pooled
//! `reqwest::Client` per run; see [`HttpTransport`].

mod http;

pub use http::{ApiResponse, HttpTransport, RestTransport, TransportError};
