use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::KvService;

use chanrpc::anyhow::Result;
use log::debug;

/// In-memory key/value store that applies each mutating request at most once.
///
/// All state sits behind one lock: the key/value map itself plus, per client,
/// the highest applied request id and the reply returned for that client's
/// last fresh append. A mutating request whose id is not above the recorded
/// one is a redelivery of an already-applied operation and must not touch the
/// map; a redelivered append is answered from the saved reply, since
/// recomputing it would read the already-extended value.
#[derive(Default)]
pub struct MemKv {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    data: HashMap<String, String>,
    last_applied: HashMap<i64, i64>,
    last_value: HashMap<i64, String>,
}

impl Tables {
    fn is_applied(&self, client_id: i64, request_id: i64) -> bool {
        self.last_applied
            .get(&client_id)
            .is_some_and(|&last| request_id <= last)
    }
}

impl MemKv {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `key`, or the empty string if absent.
    ///
    /// Reads have no side effects, so they carry no request id and are never
    /// deduplicated.
    pub fn get(&self, key: &str) -> String {
        let t = self.tables.lock().unwrap();
        t.data.get(key).cloned().unwrap_or_default()
    }

    /// Overwrite `key` with `value` and return the written value.
    ///
    /// A redelivery acks without touching the map; its reply is the empty
    /// string, since put replies carry nothing a client depends on beyond
    /// the ack itself.
    pub fn put(&self, client_id: i64, request_id: i64, key: String, value: String) -> String {
        let mut t = self.tables.lock().unwrap();
        if t.is_applied(client_id, request_id) {
            debug!("duplicate put c={} r={}", client_id, request_id);
            return String::new();
        }
        t.data.insert(key, value.clone());
        t.last_applied.insert(client_id, request_id);
        value
    }

    /// Extend `key` with `value` and return the value it held just before.
    ///
    /// A redelivery returns the reply saved when the request first applied
    /// and leaves the map untouched.
    pub fn append(&self, client_id: i64, request_id: i64, key: String, value: String) -> String {
        let mut t = self.tables.lock().unwrap();
        if t.is_applied(client_id, request_id) {
            debug!("duplicate append c={} r={}", client_id, request_id);
            return t.last_value.get(&client_id).cloned().unwrap_or_default();
        }
        let prev = t.data.get(&key).cloned().unwrap_or_default();
        t.data.insert(key, format!("{}{}", prev, value));
        t.last_applied.insert(client_id, request_id);
        t.last_value.insert(client_id, prev.clone());
        prev
    }
}

/// RPC-facing node serving a shared store.
pub struct Node {
    store: Arc<MemKv>,
}

impl Node {
    /// Create a node serving `store`.
    pub fn new(store: Arc<MemKv>) -> Self {
        Self { store }
    }
}

#[chanrpc::async_trait]
impl KvService for Node {
    async fn get(&mut self, key: String) -> Result<String> {
        Ok(self.store.get(&key))
    }
    async fn put(
        &mut self,
        client_id: i64,
        request_id: i64,
        key: String,
        value: String,
    ) -> Result<String> {
        Ok(self.store.put(client_id, request_id, key, value))
    }
    async fn append(
        &mut self,
        client_id: i64,
        request_id: i64,
        key: String,
        value: String,
    ) -> Result<String> {
        Ok(self.store.append(client_id, request_id, key, value))
    }
}
