//! In-process request/reply RPC over tokio channels.
//!
//! Services are declared with [`service!`], which generates a typed
//! client/server pair. A [`Network`] routes serialized requests between them
//! and can be configured to lose, sever, and duplicate deliveries, so that
//! at-least-once delivery can be simulated for services that must apply
//! requests at most once.

pub mod client;
mod macros;
pub mod network;
pub mod server;

pub use anyhow;
pub use async_trait::async_trait;
pub use futures;
pub use log;
pub use rand;
pub use serde;
pub use serde_json;
pub use tokio;

pub use network::Network;
