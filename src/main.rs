use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use advisory_chat::{Config, HttpBackend, Role, Session, KNOWN_MODELS};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

const TICK_RATE: Duration = Duration::from_millis(150);

#[derive(Parser)]
#[command(name = "advisor")]
#[command(version, about = "Chat with a knowledge-advisory backend from the terminal")]
struct Cli {
    /// Config file (defaults to the per-user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, e.g. http://localhost:8000
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Query endpoint path, e.g. /chat or /query
    #[arg(long, global = true)]
    path: Option<String>,

    /// Model identifier sent with each query
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Where the terminal UI writes its log
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,
    /// Send one question and print the answer
    Ask {
        /// Your question
        question: Option<String>,
        /// Plain-text file to send along with the question
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Print the new messages as JSON
        #[arg(long)]
        json: bool,
    },
    /// Probe the backend health endpoint
    Check,
    /// List available models
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::get_config_path()?,
    };
    let config = load_config(&cli, &config_path)?;

    match cli.command {
        None | Some(Commands::Chat) => {
            let log_path = match &cli.log_file {
                Some(path) => path.clone(),
                None => Config::get_config_dir()?.join("advisor.log"),
            };
            init_file_logging(&log_path)?;
            run_tui(config, config_path).await
        }
        Some(Commands::Ask {
            question,
            file,
            json,
        }) => {
            init_stderr_logging();
            run_ask(&config, question, file.as_deref(), json).await
        }
        Some(Commands::Check) => {
            init_stderr_logging();
            run_check(&config).await
        }
        Some(Commands::Models) => {
            list_models(&config);
            Ok(())
        }
    }
}

fn load_config(cli: &Cli, path: &Path) -> Result<Config> {
    let mut config = Config::load_from(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    config.apply_env();
    config.apply_overrides(cli.base_url.clone(), cli.model.clone());
    if let Some(query_path) = &cli.path {
        config.query_path = query_path.clone();
    }
    config.validate()?;
    Ok(config)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_file_logging(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

async fn run_tui(config: Config, config_path: PathBuf) -> Result<()> {
    let backend = Arc::new(HttpBackend::new(&config)?);
    tracing::info!(url = %backend.query_url(), model = %config.default_model, "Starting chat");

    let mut app = App::new(&config, config_path, backend);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(TICK_RATE);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }
            app.poll_query().await;
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    tracing::info!("Chat closed");
    result
}

async fn run_ask(
    config: &Config,
    question: Option<String>,
    file: Option<&Path>,
    json: bool,
) -> Result<()> {
    let backend = HttpBackend::new(config)?;
    let mut session = Session::new(config);

    if let Some(question) = question {
        session.composer_mut().set_text(question);
    }
    if let Some(path) = file {
        session
            .composer_mut()
            .attach_file(path, config.max_file_bytes)
            .await
            .with_context(|| format!("Could not attach {}", path.display()))?;
    }
    if session.composer().text().trim().is_empty() && !session.composer().has_file() {
        bail!("Nothing to send: give a question or --file");
    }

    let before = session.transcript().len();
    session.dispatch(&backend, &config.default_model).await?;
    let messages = &session.transcript().messages()[before..];

    if json {
        println!("{}", serde_json::to_string_pretty(messages)?);
        return Ok(());
    }

    for message in messages {
        let heading = match message.role {
            Role::User => "You:",
            Role::Assistant => "Advisor:",
        };
        println!("{}", heading);
        for line in message.content.display_lines() {
            println!("{}", line);
        }
        println!();
    }
    Ok(())
}

async fn run_check(config: &Config) -> Result<()> {
    let backend = HttpBackend::new(config)?;
    match backend.check().await {
        Ok(message) => {
            println!("✅ {} is up: {}", config.base_url, message);
            Ok(())
        }
        Err(err) => bail!("❌ {} is not reachable: {}", config.base_url, err),
    }
}

fn list_models(config: &Config) {
    println!("🤖 Available models:\n");
    for (id, name) in KNOWN_MODELS {
        let marker = if *id == config.default_model { "*" } else { " " };
        println!("{} {:<18} {}", marker, id, name);
    }
}
