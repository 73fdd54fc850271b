//! HTTP adapters

pub mod pages_client;

pub use pages_client::HttpPagesClient;
