use super::*;

use crate::client::Clerk;
use crate::kv::{MemKv, Node};

use chanrpc::tokio;
use chanrpc::tokio::task::JoinHandle;
use chanrpc::Network;
use std::sync::Arc;

/// Start one KV server on `net` and return its typed client, the shared
/// store, and the spawned server and network tasks.
pub fn kv_server(mut net: Network) -> (KvClient, Arc<MemKv>, JoinHandle<()>, JoinHandle<()>) {
    let store = Arc::new(MemKv::new());

    let s = store.clone();
    let (client, server_routine) = net
        .register_service::<KvServer<Node>, _, _, _>("kv-0".to_string(), move || {
            Node::new(s.clone())
        });
    let server = tokio::spawn(server_routine);

    // Wait until the server finishes registration.
    let nodes = net.nodes.clone();
    loop {
        if nodes.lock().unwrap().get("kv-0").is_some() {
            break;
        }
    }

    let net_thread = tokio::spawn(async move {
        net.run().await;
    });

    (client, store, server, net_thread)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 20)]
async fn test_reliable_ops() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (client, store, _server, _net) = kv_server(Network::new());

    let mut ck = Clerk::new(client);
    assert_eq!(ck.get("x").await, "");
    assert_eq!(ck.put("x", "1").await, "1");
    assert_eq!(ck.get("x").await, "1");
    assert_eq!(ck.append("x", "23").await, "1");
    assert_eq!(ck.get("x").await, "123");
    assert_eq!(store.get("x"), "123");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 20)]
async fn test_unreliable_append_chain() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (client, store, _server, _net) = kv_server(Network::unreliable(0.2, 0.2));

    let mut ck = Clerk::new(client);
    let mut expect = String::new();
    for i in 0..30 {
        let chunk = format!("[{}]", i);
        // The reply must be the exact pre-append value even when the first
        // delivery applied and only the retry came back.
        assert_eq!(ck.append("x", &chunk).await, expect);
        expect.push_str(&chunk);
    }
    assert_eq!(ck.get("x").await, expect);
    assert_eq!(store.get("x"), expect);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 20)]
async fn test_unreliable_put_settles_on_last_value() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (client, store, _server, _net) = kv_server(Network::unreliable(0.2, 0.2));

    let mut ck = Clerk::new(client);
    for i in 0..20 {
        ck.put("x", &format!("v{}", i)).await;
    }
    assert_eq!(ck.get("x").await, "v19");
    assert_eq!(store.get("x"), "v19");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 20)]
async fn test_unreliable_many_clients() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (client, store, _server, _net) = kv_server(Network::unreliable(0.15, 0.15));

    const NCLIENT: usize = 5;
    const NCHUNK: usize = 10;

    // Writers share one key; every chunk must land exactly once, and one
    // writer's chunks must land in issue order.
    let mut writers = Vec::new();
    for c in 0..NCLIENT {
        let client = client.clone();
        writers.push(tokio::spawn(async move {
            let mut ck = Clerk::new(client);
            for r in 0..NCHUNK {
                ck.append("x", &format!("x {} {} y", c, r)).await;
            }
        }));
    }
    for w in writers {
        w.await.expect("writers should not panic");
    }

    let v = store.get("x");
    for c in 0..NCLIENT {
        let mut pos = 0;
        for r in 0..NCHUNK {
            let chunk = format!("x {} {} y", c, r);
            assert_eq!(
                v.match_indices(&chunk).count(),
                1,
                "chunk {:?} in {:?}",
                chunk,
                v
            );
            let at = v[pos..]
                .find(&chunk)
                .expect("chunks of one client stay in order");
            pos += at + chunk.len();
        }
    }
}
