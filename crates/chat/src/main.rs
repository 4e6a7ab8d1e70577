use anyhow::{Context, Result};
use chat::{ChatSession, SourceRenderer, WebhookClient};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rag_core::Config;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "chat")]
#[command(about = "Chat with your documents through the workflow webhook", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file (defaults to CONFIG_PATH or ./config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Webhook URL (overrides chat.webhook_url and WEBHOOK_URL)
    #[arg(short, long)]
    webhook_url: Option<String>,
}

enum Input {
    Question(String),
    History,
    Quit,
    Empty,
}

fn parse_input(line: &str) -> Input {
    match line.trim() {
        "" => Input::Empty,
        "/quit" | "/exit" => Input::Quit,
        "/history" => Input::History,
        question => Input::Question(question.to_string()),
    }
}

async fn read_line() -> Result<Option<String>> {
    print!("You: ");
    std::io::stdout().flush()?;

    tokio::task::spawn_blocking(|| -> Result<Option<String>> {
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    })
    .await
    .context("Input task failed")?
}

/// `RUST_LOG` when set, `info` otherwise, like the other binaries.
fn log_filter(configured: Option<String>) -> String {
    configured
        .filter(|filter| !filter.trim().is_empty())
        .unwrap_or_else(|| "info".to_string())
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("🤖 Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    std::env::set_var("RUST_LOG", log_filter(std::env::var("RUST_LOG").ok()));
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let loaded = match cli.config.as_deref() {
        Some(path) => Config::load(path),
        None => Config::load_from_env(),
    };
    let mut chat_config = loaded
        .map(|config| config.chat)
        .unwrap_or_else(|e| {
            warn!("Could not load config ({}), using default chat settings", e);
            Default::default()
        })
        .with_env_overrides();
    if let Some(url) = cli.webhook_url {
        chat_config.webhook_url = url;
    }

    let client = WebhookClient::new(&chat_config)?;
    let renderer = SourceRenderer::new(&chat_config.image_dir);
    let mut session = ChatSession::new();

    println!("📚 Chat with RAG System");
    println!("Webhook: {}", client.url());
    println!("Ask a question about your documents. /history replays the session, /quit exits.");

    while let Some(line) = read_line().await? {
        let question = match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::History => {
                if session.is_empty() {
                    println!("(no messages yet)");
                } else {
                    print!("{}", session.replay(&renderer));
                }
                continue;
            }
            Input::Question(question) => question,
        };

        session.push_user(question.as_str());

        let spinner = thinking_spinner();
        let reply = client.query(&question).await;
        spinner.finish_and_clear();

        println!("Assistant: {}", reply.answer);
        print!("{}", renderer.render(&reply.sources));
        session.push_assistant(reply);
    }

    Ok(())
}
