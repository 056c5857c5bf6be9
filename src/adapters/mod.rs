//! Backend adapters
//!
//! - endpoints: REST route table
//! - http_client: authenticated JSON/multipart transport
//! - backend: the `Backend` trait and its HTTP implementation

pub mod backend;
pub mod endpoints;
pub mod http_client;

pub use backend::{Backend, HttpBackend};
pub use http_client::HttpClient;
