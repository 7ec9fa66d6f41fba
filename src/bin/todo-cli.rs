use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "todo-cli")]
#[command(about = "Command-line client for the todo API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Tenant id sent in the group header
    #[arg(short, long)]
    group: Option<String>,

    #[arg(long, default_value = "x-group-id")]
    group_header: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all todo items
    List,
    /// Create a todo item
    Create {
        text: String,
        /// Due date (RFC 3339 or YYYY-MM-DD)
        #[arg(short, long)]
        due: Option<String>,
        #[arg(long)]
        done: bool,
    },
    /// Show one todo item
    Get { id: String },
    /// Delete a todo item
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if let Some(group) = &cli.group {
        headers.insert(
            HeaderName::from_bytes(cli.group_header.as_bytes())?,
            HeaderValue::from_str(group)?,
        );
    }

    match cli.command {
        Commands::List => {
            let res = client
                .get(format!("{}/todos", base))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Create { text, due, done } => {
            let body = json!({ "text": text, "dueDate": due, "done": done });
            let res = client
                .post(format!("{}/todos", base))
                .headers(headers)
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Get { id } => {
            let res = client
                .get(format!("{}/todos/{}", base, id))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Delete { id } => {
            let res = client
                .delete(format!("{}/todos/{}", base, id))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: todo API returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        return Ok(());
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }
    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
