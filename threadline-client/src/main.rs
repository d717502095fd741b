//! Main entry point for the Threadline command-line client.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::io::{BufRead, Write};

use client::api::ApiClient;
use client::state::{Action, SessionState};
use shared::models::Message;
use shared::thread_ref::ThreadRef;

/// Threadline CLI
#[derive(Parser)]
#[command(name = "threadline")]
#[command(about = "Command-line client for Threadline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print a bearer token for later use
    Login {
        /// Account email address
        #[arg(long)]
        email: String,

        /// Threadline server base URL
        #[arg(long, default_value = "http://localhost:7000")]
        server: String,
    },
    /// Start an interactive chat session
    Chat {
        /// Bearer token; falls back to the THREADLINE_TOKEN environment
        /// variable
        #[arg(long)]
        token: Option<String>,

        /// Existing thread id to continue; a new thread is started otherwise
        #[arg(long)]
        thread: Option<String>,

        /// Threadline server base URL
        #[arg(long, default_value = "http://localhost:7000")]
        server: String,
    },
    /// List your threads
    Threads {
        /// Bearer token; falls back to the THREADLINE_TOKEN environment
        /// variable
        #[arg(long)]
        token: Option<String>,

        /// Threadline server base URL
        #[arg(long, default_value = "http://localhost:7000")]
        server: String,
    },
}

fn resolve_token(flag: Option<String>) -> Result<String> {
    flag.or_else(|| std::env::var("THREADLINE_TOKEN").ok())
        .context("no token given; pass --token or set THREADLINE_TOKEN")
}

async fn handle_login(email: &str, server: &str) -> Result<()> {
    let password = rpassword::prompt_password("Password: ")?;
    let api = ApiClient::new(server)?;
    let auth = api.login(email, &password).await?;

    println!("Logged in as {} <{}>", auth.user.username, auth.user.email);
    println!("{}", auth.token);
    Ok(())
}

async fn handle_threads(token: Option<String>, server: &str) -> Result<()> {
    let api = ApiClient::new(server)?.with_token(resolve_token(token)?);
    let threads = api.list_threads().await?;

    if threads.is_empty() {
        println!("No threads yet.");
        return Ok(());
    }
    for summary in threads {
        println!(
            "{}  {} ({} messages)",
            summary.thread_id, summary.title, summary.message_count
        );
    }
    Ok(())
}

async fn handle_chat(token: Option<String>, thread: Option<String>, server: &str) -> Result<()> {
    let api = ApiClient::new(server)?.with_token(resolve_token(token)?);
    let mut state = SessionState::new();

    match thread {
        Some(id) => {
            let detail = api.get_thread(&id).await?;
            state.apply(Action::MergeServerList {
                server: vec![client::merge::ThreadEntry {
                    id: ThreadRef::Canonical(detail.thread_id.clone()),
                    title: detail.title.clone(),
                    messages: detail.messages.clone(),
                }],
            });
            state.apply(Action::SelectThread {
                id: ThreadRef::Canonical(detail.thread_id),
            });
            for message in &detail.messages {
                println!("{}: {}", message.role, message.content);
            }
        }
        None => {
            state.apply(Action::CreateLocalThread {
                title: String::new(),
            });
        }
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text == "/quit" {
            break;
        }

        let current = state
            .current
            .clone()
            .context("no thread selected")?;
        state.apply(Action::AppendMessage {
            id: current.clone(),
            message: Message::user(text),
        });

        match api.chat(&current.to_string(), text).await {
            Ok(response) => {
                if current.to_string() != response.thread_id {
                    state.apply(Action::PromoteToCanonical {
                        temp_id: current,
                        id: response.thread_id.clone(),
                    });
                }
                let canonical = ThreadRef::Canonical(response.thread_id);
                state.apply(Action::AppendMessage {
                    id: canonical,
                    message: Message::assistant(&response.reply),
                });
                println!("assistant: {}", response.reply);
            }
            Err(err) => {
                // The optimistic message stays in place; the thread remains
                // provisional until a submission succeeds.
                eprintln!("error: {err}");
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Login { email, server } => handle_login(&email, &server).await,
        Commands::Chat {
            token,
            thread,
            server,
        } => handle_chat(token, thread, &server).await,
        Commands::Threads { token, server } => handle_threads(token, &server).await,
    }
}
