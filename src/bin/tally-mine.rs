#![forbid(unsafe_code)]
use std::env;
use std::time::Instant;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <node-addr> [count]", args[0]);
        return;
    }
    let node = &args[1];
    let count: u32 = if args.len() > 2 {
        args[2].parse().unwrap_or(1)
    } else {
        1
    };

    println!("⛏️  Mining {} block(s) via {}", count, node);

    let client = reqwest::Client::new();
    for n in 1..=count {
        let start = Instant::now();
        let response = client.get(format!("http://{}/mine", node)).send().await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                let body: serde_json::Value = match resp.json().await {
                    Ok(body) => body,
                    Err(e) => {
                        eprintln!("❌ Bad response: {}", e);
                        return;
                    }
                };
                let block = &body["block"];
                println!(
                    "✅ [{}/{}] Sealed block #{} (proof = {}, transfers = {}, {:.3}s)",
                    n,
                    count,
                    block["index"],
                    block["proof"],
                    block["transfers"].as_array().map(|t| t.len()).unwrap_or(0),
                    start.elapsed().as_secs_f64()
                );
            }
            Ok(resp) => {
                eprintln!("❌ Mining failed: {}", resp.status());
                return;
            }
            Err(e) => {
                eprintln!("❌ Failed to reach node: {}", e);
                return;
            }
        }
    }
}
