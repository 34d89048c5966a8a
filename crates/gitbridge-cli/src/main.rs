//! GitBridge CLI - MCP gateway for GitHub repositories.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use gitbridge_core::{CompletionProvider, Config, RepositoryProvider};
use gitbridge_github::GitHubClient;
use gitbridge_mcp::protocol::{decode_response, JsonRpcRequest, RequestId, ServerInfo};
use gitbridge_mcp::{
    router, Dispatcher, GatewayState, RepositoryAnalyzer, SessionTiming, StdioTransport,
    ToolRegistry, UpstreamInvoker,
};
use gitbridge_openrouter::OpenRouterClient;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gitbridge")]
#[command(author, version, long_about = None)]
#[command(about = "GitBridge - MCP gateway for GitHub repositories")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Speak JSON-RPC over stdin/stdout instead of HTTP
        #[arg(long)]
        stdio: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// List the tools the gateway exposes
    Tools,

    /// Fetch a repository summary
    Repo {
        /// Repository as owner/name
        slug: String,
    },

    /// Send one JSON-RPC request to a running gateway
    Call {
        /// Gateway endpoint (default: http://127.0.0.1:<server.port>/mcp)
        #[arg(long)]
        url: Option<String>,

        /// JSON-RPC method
        method: String,

        /// Params as a JSON object
        #[arg(long)]
        params: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set a value (e.g. `server.port 8080`)
    Set { key: String, value: String },

    /// Print a value
    Get { key: String },

    /// Show current configuration
    Show,

    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for stdio mode and command output
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    match cli.command {
        Some(Commands::Serve { host, port, stdio }) => {
            let mut config = load_config(&config_path)?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config, stdio).await?;
        }
        Some(Commands::Config { command }) => handle_config(command, &config_path)?,
        Some(Commands::Tools) => {
            for tool in ToolRegistry::builtin().list() {
                println!("{:<22} {}", tool.name, tool.description);
            }
        }
        Some(Commands::Repo { slug }) => {
            let config = load_config(&config_path)?;
            let (owner, repo) = slug
                .split_once('/')
                .filter(|(o, r)| !o.is_empty() && !r.is_empty())
                .with_context(|| format!("expected owner/name, got '{}'", slug))?;

            let client = github_client(&config);
            let summary = client.get_repository(owner, repo).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Some(Commands::Call {
            url,
            method,
            params,
        }) => {
            let config = load_config(&config_path)?;
            let url =
                url.unwrap_or_else(|| format!("http://127.0.0.1:{}/mcp", config.server.port));
            call(&url, &method, params.as_deref()).await?;
        }
        None => {
            println!("GitBridge - MCP gateway for GitHub repositories");
            println!("Run with --help for usage information");
        }
    }

    Ok(())
}

/// Load the config file and apply environment overrides.
fn load_config(path: &std::path::Path) -> anyhow::Result<Config> {
    let mut config = Config::load_from(path)?;
    config.apply_env()?;
    Ok(config)
}

fn github_client(config: &Config) -> GitHubClient {
    GitHubClient::with_base_url(config.github.base_url.clone(), Config::github_token())
}

/// Wire the collaborators into a dispatcher.
fn build_dispatcher(config: &Config) -> Arc<Dispatcher> {
    let repos: Arc<dyn RepositoryProvider> = Arc::new(github_client(config));

    let llm = Config::llm_api_key().map(|key| {
        let client = OpenRouterClient::with_base_url(config.llm.api_url.clone(), key)
            .with_model(config.llm.model.clone())
            .with_referer(config.llm.referer.clone());
        Arc::new(client) as Arc<dyn CompletionProvider>
    });
    if Config::github_token().is_none() {
        tracing::warn!("GITHUB_TOKEN is not set, using unauthenticated GitHub requests");
    }

    let analyzer = RepositoryAnalyzer::new(repos.clone(), llm, config.llm.model.clone());
    if !analyzer.is_configured() {
        tracing::warn!("OPENROUTER_API_KEY is not set, repository analysis is disabled");
    }
    let invoker = UpstreamInvoker::new(repos, analyzer);

    Arc::new(Dispatcher::new(
        Arc::new(ToolRegistry::builtin()),
        Arc::new(invoker),
        ServerInfo::new("gitbridge", env!("CARGO_PKG_VERSION")),
    ))
}

async fn serve(config: Config, stdio: bool) -> anyhow::Result<()> {
    let dispatcher = build_dispatcher(&config);

    if stdio {
        let mut transport = StdioTransport::stdio();
        transport.run(&dispatcher).await?;
        return Ok(());
    }

    let state = GatewayState::new(dispatcher, SessionTiming::from(&config.sse));
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("MCP endpoint: http://{}/mcp", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

fn handle_config(command: ConfigCommands, path: &std::path::Path) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_from(path)?;
            config.set(&key, &value)?;
            config.save_to(path)?;
            println!("{} = {}", key, value);
        }
        ConfigCommands::Get { key } => match Config::load_from(path)?.get(&key)? {
            Some(value) => println!("{}", value),
            None => println!("{} is not set", key),
        },
        ConfigCommands::Show => {
            let config = Config::load_from(path)?;
            println!("# {}", path.display());
            print!("{}", render_config(&config)?);
            println!(
                "# GITHUB_TOKEN: {}",
                if Config::github_token().is_some() { "set" } else { "not set" }
            );
            println!(
                "# OPENROUTER_API_KEY: {}",
                if Config::llm_api_key().is_some() { "set" } else { "not set" }
            );
        }
        ConfigCommands::Path => println!("{}", path.display()),
    }

    Ok(())
}

fn render_config(config: &Config) -> anyhow::Result<String> {
    let mut out = String::new();
    for key in [
        "server.host",
        "server.port",
        "github.base_url",
        "llm.api_url",
        "llm.model",
        "llm.referer",
        "sse.catalog_delay_ms",
        "sse.keepalive_interval_ms",
    ] {
        if let Some(value) = config.get(key)? {
            out.push_str(&format!("{} = {}\n", key, value));
        }
    }
    Ok(out)
}

async fn call(url: &str, method: &str, params: Option<&str>) -> anyhow::Result<()> {
    let params = params
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .context("--params must be valid JSON")?;
    let request = JsonRpcRequest::new(RequestId::from(1), method, params);

    tracing::debug!(url = url, method = method, "Sending request");

    let response: serde_json::Value = reqwest::Client::new()
        .post(url)
        .json(&request)
        .send()
        .await
        .with_context(|| format!("failed to reach {}", url))?
        .json()
        .await
        .context("gateway returned a non-JSON response")?;

    match decode_response(response) {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(error) if error.is_server_error() => {
            bail!("gateway failed to handle the request: {}", error)
        }
        Err(error) => bail!("{}", error),
    }
}
