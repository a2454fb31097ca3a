use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(name = "modectl")]
#[command(about = "Command-line client for the device mode control API", long_about = None)]
struct Cli {
    #[arg(short, long, env = "MODE_CONTROL_URL", default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show service and polling status
    Status,
    /// Show the current mode and its settings
    Get,
    /// Switch mode, optionally updating that mode's settings
    Set {
        /// led, web, chromecast or powerpoint
        mode: String,
        #[arg(long)]
        web_url: Option<String>,
        #[arg(long)]
        chromecast_name: Option<String>,
        #[arg(long)]
        youtube_video_id: Option<String>,
        #[arg(long)]
        ppt_email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/api/status", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Get => {
            let res = client.get(format!("{}/api/config", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Set {
            mode,
            web_url,
            chromecast_name,
            youtube_video_id,
            ppt_email,
        } => {
            let mut body = Map::new();
            body.insert("mode".into(), json!(mode));
            for (key, value) in [
                ("web_url", web_url),
                ("chromecast_name", chromecast_name),
                ("youtube_video_id", youtube_video_id),
                ("ppt_email", ppt_email),
            ] {
                if let Some(value) = value {
                    body.insert(key.into(), json!(value));
                }
            }

            let res = client
                .post(format!("{}/api/config", base))
                .json(&Value::Object(body))
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

    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        match serde_json::from_str::<Value>(&text) {
            Ok(json) => eprintln!("{}", json["error"].as_str().unwrap_or(&text)),
            Err(_) => eprintln!("Response: {}", text),
        }
        std::process::exit(1);
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
