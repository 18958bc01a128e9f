use super::KvClient;

use chanrpc::log::warn;
use rand::Rng;

/// Client-side stub for the KV service.
///
/// Every logical mutating operation gets the next request id, and the
/// identical request is resent until a reply is observed, so a lost reply
/// turns into a redelivery the server suppresses. Mutating calls take
/// `&mut self`, which keeps at most one of this clerk's requests in flight.
pub struct Clerk {
    client: KvClient,
    client_id: i64,
    request_id: i64,
}

impl Clerk {
    /// Create a clerk speaking to the given service client.
    pub fn new(client: KvClient) -> Self {
        Self {
            client,
            client_id: rand::thread_rng().gen_range(0..i64::MAX),
            request_id: 0,
        }
    }

    /// Fetch the current value of `key`, or the empty string if absent.
    pub async fn get(&self, key: &str) -> String {
        loop {
            match self.client.get(key.to_string()).await {
                Ok(v) => return v,
                Err(e) => warn!("get {} retry: {}", key, e),
            }
        }
    }

    /// Overwrite `key` with `value`.
    pub async fn put(&mut self, key: &str, value: &str) -> String {
        self.request_id += 1;
        loop {
            match self
                .client
                .put(
                    self.client_id,
                    self.request_id,
                    key.to_string(),
                    value.to_string(),
                )
                .await
            {
                Ok(v) => return v,
                Err(e) => warn!("put {} retry: {}", key, e),
            }
        }
    }

    /// Extend `key` with `value`, returning the value it held just before.
    pub async fn append(&mut self, key: &str, value: &str) -> String {
        self.request_id += 1;
        loop {
            match self
                .client
                .append(
                    self.client_id,
                    self.request_id,
                    key.to_string(),
                    value.to_string(),
                )
                .await
            {
                Ok(v) => return v,
                Err(e) => warn!("append {} retry: {}", key, e),
            }
        }
    }
}
