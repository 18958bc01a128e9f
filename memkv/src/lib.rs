#![deny(missing_docs)]
#![deny(clippy::all)]
//! In-memory KV store applying retried client requests at most once.

chanrpc::service! {
    service kv_service {
        fn get(key: String) -> String;
        fn put(client_id: i64, request_id: i64, key: String, value: String) -> String;
        fn append(client_id: i64, request_id: i64, key: String, value: String) -> String;
    }
}

pub use kv_service::{Client as KvClient, Server as KvServer, Service as KvService};

/// KV Store Server.
pub mod kv;

/// KV Store Client.
pub mod client;

/// Util function for testing.
pub mod tests;
