#![forbid(unsafe_code)]
//! Network node for tallychain

use std::env;
use std::sync::Arc;
use tallychain::node::Node;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut node = Node::init().await?;

    // An optional positional port overrides config.toml, handy when
    // running several nodes side by side on one machine.
    if args.len() > 1 {
        match args[1].parse::<u16>() {
            Ok(port) => node.config.network.api_port = port,
            Err(_) => {
                eprintln!("Usage: {} [api-port]", args[0]);
                return Ok(());
            }
        }
    }

    println!(
        "⛓️  tallychain node starting (API port {})",
        node.config.network.api_port
    );

    Arc::new(node).start().await
}
