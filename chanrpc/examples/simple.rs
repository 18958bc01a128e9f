use chanrpc::{anyhow::Result, tokio, Network};

chanrpc::service! {
    service echo {
        fn say(x: String) -> String;
    }
}

struct Echo;

#[chanrpc::async_trait]
impl echo::Service for Echo {
    async fn say(&mut self, x: String) -> Result<String> {
        Ok(x)
    }
}

#[tokio::main]
async fn main() {
    let mut net = Network::new();
    let (client, server_routine) =
        net.register_service::<echo::Server<Echo>, echo::Client, _, _>("echo-0".to_string(), || Echo);
    tokio::spawn(server_routine);

    // Wait until the server finishes registration.
    let nodes = net.nodes.clone();
    loop {
        if nodes.lock().unwrap().get("echo-0").is_some() {
            break;
        }
    }

    tokio::spawn(async move {
        net.run().await;
    });

    let resp = client.say("hello".to_string()).await.expect("echo should reply");
    println!("{}", resp);
}
