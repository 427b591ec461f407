mod chunk;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use parley_config::ParleyConfig;
use parley_core::{ToolRegistry, Turn};
use parley_engine::{compose, ChatEngine, FlairPolicy};
use parley_provider::{GeminiProvider, OpenRouterProvider, ProviderRegistry};
use parley_session::SessionStore;
use parley_tools::SearchWebTool;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Parley — session-aware chat relay over OpenRouter and Gemini")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the chat relay server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show server status
    Status,
    /// Split a text corpus into fixed-size word chunks for the persona preamble
    Chunk {
        /// Input text file
        #[arg(short, long)]
        input: PathBuf,
        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,
        /// Words per chunk
        #[arg(long, default_value_t = 1000)]
        chunk_size: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = parley_config::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await
        }
        Commands::Status => status(&config).await,
        Commands::Chunk {
            input,
            output,
            chunk_size,
        } => chunk::run(&input, &output, chunk_size),
    }
}

async fn run_server(config: ParleyConfig) -> Result<()> {
    info!(
        port = config.server.port,
        bind = %config.server.bind,
        models = config.models.len(),
        "Starting Parley"
    );

    let client = reqwest::Client::new();

    let mut providers = ProviderRegistry::new();
    if let Some(key) = &config.providers.openrouter_api_key {
        providers.register(Arc::new(OpenRouterProvider::new(client.clone(), key)));
        info!("Registered OpenRouter provider");
    } else {
        warn!("OPENROUTER_API_KEY not set; OpenRouter models will fail");
    }
    if let Some(key) = &config.providers.gemini_api_key {
        providers.register(Arc::new(GeminiProvider::new(client.clone(), key)));
        info!("Registered Gemini provider");
    }

    if config.providers.serpapi_api_key.is_none() {
        warn!("SERPAPI_API_KEY not set; web search degrades to a placeholder");
    }
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(SearchWebTool::new(
        client,
        config.providers.serpapi_api_key.clone(),
    )));

    let knowledge = match &config.persona.knowledge_path {
        Some(path) => match compose::load_knowledge_chunk(path) {
            Ok(chunk) => chunk,
            Err(err) => {
                warn!(error = %err, "Failed to load knowledge file");
                None
            }
        },
        None => None,
    };
    let preamble = compose::persona_preamble(&config.persona.text, knowledge.as_deref());

    let store = Arc::new(SessionStore::new(
        config.session.max_sessions,
        Turn::system(preamble),
    ));
    let engine = ChatEngine::new(
        store,
        providers,
        tools,
        config.models.clone(),
        FlairPolicy::from_config(&config.flair),
    );

    parley_gateway::serve(&config.server, engine).await
}

async fn status(config: &ParleyConfig) -> Result<()> {
    let client = reqwest::Client::new();
    match client
        .get(format!(
            "http://localhost:{}/api/health",
            config.server.port
        ))
        .send()
        .await
    {
        Ok(resp) => {
            let body: serde_json::Value = resp.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Err(_) => {
            println!("Parley is not running on port {}", config.server.port);
        }
    }
    Ok(())
}
