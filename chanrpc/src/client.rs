use tokio::sync::mpsc::Sender;

use crate::network::NetworkPackage;

/// Constructor seam [`Network::register_service`](crate::Network::register_service)
/// uses to hand out typed clients.
pub trait Client {
    fn from_server(server_id: String, net_tx: Sender<NetworkPackage>) -> Self;
}
