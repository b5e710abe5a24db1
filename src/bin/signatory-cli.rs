use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "signatory-cli")]
#[command(about = "Operator CLI for a running signatory instance", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:4567")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the key is unlocked
    Status,
    /// Request a signed transfer
    Sign {
        /// Destination address (must be allow-listed)
        #[arg(short, long)]
        destination: String,

        /// Amount in wei, decimal or 0x hex
        #[arg(short, long)]
        wei: String,

        /// Use this nonce instead of asking the explorer
        #[arg(short, long)]
        nonce: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/status", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Sign {
            destination,
            wei,
            nonce,
        } => {
            let mut body = json!({ "destination": destination, "wei": wei });
            if let Some(nonce) = nonce {
                body["nonce"] = json!(nonce);
            }
            let res = client
                .post(format!("{}/sign", base))
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => {
            let rendered = serde_json::to_string_pretty(&json)?;
            if status.is_success() {
                println!("{}", rendered);
            } else {
                eprintln!("Error: signatory returned status {}", status);
                eprintln!("{}", rendered);
                std::process::exit(1);
            }
        }
        Err(_) => {
            eprintln!("Error: signatory returned status {}", status);
            eprintln!("Response: {}", text);
            std::process::exit(1);
        }
    }
    Ok(())
}
