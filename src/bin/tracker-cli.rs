use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "tracker-cli")]
#[command(about = "Query a running river-tracker server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080", env = "TRACKER_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List upcoming Tower Bridge lifts
    BridgeLifts {
        /// Drop the most frequent vessels
        #[arg(long)]
        unique: bool,
    },
    /// List vessel movements
    Vessels {
        /// all, inport, arrivals, departures or forecast
        #[arg(short = 't', long = "type", default_value = "all")]
        kind: String,
        #[arg(short, long)]
        location: Option<String>,
        #[arg(long)]
        unique: bool,
    },
    /// Vessel counts per location
    Locations,
    /// Breaker and cache health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::BridgeLifts { unique } => client
            .get(format!("{}/bridge-lifts", base))
            .query(&[("unique", unique.to_string())]),
        Commands::Vessels {
            kind,
            location,
            unique,
        } => {
            let mut query = vec![("type", kind), ("unique", unique.to_string())];
            if let Some(location) = location {
                query.push(("location", location));
            }
            client.get(format!("{}/vessels", base)).query(&query)
        }
        Commands::Locations => client.get(format!("{}/locations", base)),
        Commands::Health => client.get(format!("{}/healthz", base)),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(retry_after) = res.headers().get(reqwest::header::RETRY_AFTER) {
        eprintln!("Retry-After: {}s", retry_after.to_str().unwrap_or("?"));
    }

    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: tracker returned status {}", status);
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
