use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use futures::Future;
use log::{info, trace, warn};
use rand::Rng;
use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::{client::Client, server::Server};

/// A serialized request addressed to a registered server, carrying the
/// channel its reply should travel back on.
#[derive(Debug, Clone)]
pub struct NetworkPackage {
    pub to: String,
    pub reply: Sender<String>,
    pub data: String,
}

/// Routes packages between clients and registered servers.
///
/// A reliable network delivers every package exactly once. An unreliable one
/// may drop a request before it reaches the server, deliver it but lose the
/// reply, or deliver it twice. Clients observe lost traffic as a closed reply
/// channel; it is up to them to resend.
pub struct Network {
    pub tx: Sender<NetworkPackage>,
    rx: Receiver<NetworkPackage>,
    pub nodes: Arc<Mutex<HashMap<String, Sender<NetworkPackage>>>>,
    loss: f32,
    duplication: f32,
}

impl Network {
    /// Network that delivers every package exactly once.
    pub fn new() -> Self {
        Self::with_faults(0.0, 0.0)
    }

    /// Network that loses requests and replies with probability `loss` each,
    /// and redelivers a request with probability `duplication`.
    pub fn unreliable(loss: f32, duplication: f32) -> Self {
        Self::with_faults(loss, duplication)
    }

    fn with_faults(loss: f32, duplication: f32) -> Self {
        let (tx, rx) = mpsc::channel(100);
        Self {
            tx,
            rx,
            nodes: Arc::new(Mutex::new(HashMap::default())),
            loss,
            duplication,
        }
    }

    /// Register a service under `id`, returning its typed client and the
    /// server routine to spawn. A service whose handler loop fails is
    /// recreated from `f` and re-registered.
    pub fn register_service<S, C, F, V>(&self, id: String, f: F) -> (C, impl Future<Output = ()>)
    where
        F: Fn() -> V,
        S: Server<Service = V> + Send + 'static,
        C: Client,
    {
        let client = C::from_server(id.clone(), self.tx.clone());
        let nodes = self.nodes.clone();
        (client, async move {
            loop {
                let mut server = S::from_service(f());
                nodes.lock().unwrap().insert(id.clone(), server.inbox());
                if server.run().await.is_ok() {
                    break;
                }
                info!("server {} restart", id);
            }
        })
    }

    /// Pump packages to their destinations. Never returns; spawn it on its
    /// own task.
    pub async fn run(&mut self) {
        loop {
            let p = self
                .rx
                .recv()
                .await
                .expect("sender cannot be dropped by itself");
            let (lose_request, lose_reply, duplicate) = self.roll();
            if lose_request {
                trace!("request to {} lost", p.to);
                continue;
            }
            let node = {
                let x = self.nodes.lock().unwrap();
                x.get(&p.to).cloned()
            };

            if let Some(chan) = node {
                if duplicate {
                    trace!("request to {} redelivered", p.to);
                    let copy = NetworkPackage {
                        to: p.to.clone(),
                        reply: dead_reply(),
                        data: p.data.clone(),
                    };
                    if chan.send(copy).await.is_err() {
                        warn!("send to node failed, dropped");
                    }
                }
                // Severing the reply channel makes the server apply the
                // request while the client sees only silence.
                let p = if lose_reply {
                    trace!("reply from {} will be lost", p.to);
                    NetworkPackage {
                        reply: dead_reply(),
                        ..p
                    }
                } else {
                    p
                };
                if chan.send(p).await.is_err() {
                    warn!("send to node failed, dropped");
                }
            } else {
                warn!("node not found");
            }
        }
    }

    fn roll(&self) -> (bool, bool, bool) {
        if self.loss == 0.0 && self.duplication == 0.0 {
            return (false, false, false);
        }
        let mut rng = rand::thread_rng();
        (
            rng.gen::<f32>() < self.loss,
            rng.gen::<f32>() < self.loss,
            rng.gen::<f32>() < self.duplication,
        )
    }
}

/// Reply channel whose receiver is already gone.
fn dead_reply() -> Sender<String> {
    let (tx, _) = mpsc::channel(1);
    tx
}
