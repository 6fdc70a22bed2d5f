#![forbid(unsafe_code)]
use std::env;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "peer" => {
            if args.len() < 4 {
                eprintln!("Usage: tally-connect peer <node-addr> <peer-addr>");
                return;
            }
            register_peer(&args[2], &args[3]).await;
        }
        "resolve" => {
            if args.len() < 3 {
                eprintln!("Usage: tally-connect resolve <node-addr>");
                return;
            }
            resolve(&args[2]).await;
        }
        "chain" => {
            if args.len() < 3 {
                eprintln!("Usage: tally-connect chain <node-addr>");
                return;
            }
            show_chain(&args[2]).await;
        }
        _ => print_usage(),
    }
}

async fn register_peer(node: &str, peer: &str) {
    println!("🔗 Registering peer {} on node {}", peer, node);
    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{}/nodes", node))
        .json(&serde_json::json!({ "node": peer }))
        .send()
        .await;

    match response {
        Ok(resp) if resp.status().is_success() => {
            let body: serde_json::Value = resp.json().await.unwrap_or_default();
            println!("✅ {}", body["message"].as_str().unwrap_or("registered"));
            if let Some(nodes) = body["nodes"].as_array() {
                for n in nodes {
                    println!("   peer: {}", n.as_str().unwrap_or("?"));
                }
            }
        }
        Ok(resp) => eprintln!("❌ Node rejected request: {}", resp.status()),
        Err(e) => eprintln!("❌ Failed: {}", e),
    }
}

async fn resolve(node: &str) {
    println!("🔄 Running consensus on node {}", node);
    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{}/consensus", node))
        .send()
        .await;

    match response {
        Ok(resp) if resp.status().is_success() => {
            let body: serde_json::Value = resp.json().await.unwrap_or_default();
            let replaced = body["replaced"].as_bool().unwrap_or(false);
            let height = body["chain"].as_array().map(|c| c.len()).unwrap_or(0);
            if replaced {
                println!("✅ Chain replaced by a longer peer chain ({} blocks)", height);
            } else {
                println!("✅ Local chain kept ({} blocks)", height);
            }
        }
        Ok(resp) => eprintln!("❌ Node rejected request: {}", resp.status()),
        Err(e) => eprintln!("❌ Failed: {}", e),
    }
}

async fn show_chain(node: &str) {
    let client = reqwest::Client::new();
    let response = client.get(format!("http://{}/chain", node)).send().await;

    match response {
        Ok(resp) if resp.status().is_success() => {
            let body: serde_json::Value = resp.json().await.unwrap_or_default();
            let chain = match body["chain"].as_array() {
                Some(chain) => chain,
                None => {
                    eprintln!("❌ Malformed response: no chain field");
                    return;
                }
            };
            println!("⛓️  Chain on {} ({} blocks)", node, chain.len());
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            for block in chain {
                println!(
                    "#{} proof={} transfers={}",
                    block["index"],
                    block["proof"],
                    block["transfers"].as_array().map(|t| t.len()).unwrap_or(0)
                );
            }
        }
        Ok(resp) => eprintln!("❌ Node rejected request: {}", resp.status()),
        Err(e) => eprintln!("❌ Failed: {}", e),
    }
}

fn print_usage() {
    println!("Usage:");
    println!("  tally-connect peer <node> <peer>  - Register a peer address on a node");
    println!("  tally-connect resolve <node>      - Trigger peer reconciliation");
    println!("  tally-connect chain <node>        - Show a node's chain");
}
