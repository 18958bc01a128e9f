use crate::network::NetworkPackage;
use anyhow::Result;
use tokio::sync::mpsc::Sender;

/// Server half of a generated service: owns the service value and drains its
/// inbox until an unrecoverable error.
#[async_trait::async_trait]
pub trait Server {
    type Service;
    fn from_service(svc: Self::Service) -> Self;
    /// Channel the network delivers packages to this server on.
    fn inbox(&self) -> Sender<NetworkPackage>;
    /// Receive and dispatch a single request.
    async fn handle(&mut self) -> Result<()>;
    async fn run(&mut self) -> Result<()> {
        loop {
            self.handle().await?;
        }
    }
}
