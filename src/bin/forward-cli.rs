use clap::{Parser, Subcommand, ValueEnum};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "forward-cli")]
#[command(about = "Management CLI for the forward rules daemon", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8181")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show daemon status
    Status,
    /// List profiles in display order
    List,
    /// Create a profile
    Add { name: String },
    /// Rename a profile
    Rename { id: String, name: String },
    /// Remove a profile
    Remove { id: String },
    /// Exchange the positions of two profiles
    Swap { a: String, b: String },
    /// Flip a profile's active flag
    Toggle { id: String },
    /// Replace a profile's document with the contents of a file
    Edit { id: String, file: PathBuf },
    /// Print a profile's document
    Show { id: String },
    /// Delete documents of removed profiles
    Gc,
    /// Apply the active profiles now
    Apply,
    /// List installed rules
    Rules,
    /// Turn forwarding on or off
    Switch { state: SwitchState },
}

#[derive(Clone, Copy, ValueEnum)]
enum SwitchState {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );
    let url = |path: &str| format!("{}{}", cli.url.trim_end_matches('/'), path);

    let request = match cli.command {
        Commands::Status => client.get(url("/status")),
        Commands::List => client.get(url("/profiles")),
        Commands::Add { name } => client.post(url("/profiles")).json(&json!({ "name": name })),
        Commands::Rename { id, name } => client
            .put(url(&format!("/profiles/{}", id)))
            .json(&json!({ "name": name })),
        Commands::Remove { id } => client.delete(url(&format!("/profiles/{}", id))),
        Commands::Swap { a, b } => client
            .post(url("/profiles/swap"))
            .json(&json!({ "a": a, "b": b })),
        Commands::Toggle { id } => client.post(url(&format!("/profiles/{}/toggle", id))),
        Commands::Edit { id, file } => {
            let text = tokio::fs::read_to_string(&file).await?;
            client.put(url(&format!("/profiles/{}/config", id))).body(text)
        }
        Commands::Show { id } => {
            let res = client
                .get(url(&format!("/profiles/{}/config", id)))
                .headers(headers)
                .send()
                .await?;
            return print_text(res).await;
        }
        Commands::Gc => client.post(url("/gc")),
        Commands::Apply => client.post(url("/apply")),
        Commands::Rules => client.get(url("/rules")),
        Commands::Switch { state } => client.put(url("/switch")).json(&json!({
            "enabled": matches!(state, SwitchState::On)
        })),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("OK");
        return Ok(());
    }
    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn print_text(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        return Ok(());
    }
    print!("{}", res.text().await?);
    Ok(())
}
