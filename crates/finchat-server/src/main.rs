//! finchat server binary

use anyhow::Context;
use clap::Parser;
use finchat_llm::providers::GeminiProvider;
use finchat_market::prompts::system_instruction;
use finchat_market::{MarketConfig, MarketDataGateway, YahooGateway, register_market_tools};
use finchat_runtime::{AgentExecutor, ConversationBridge, DEFAULT_MODEL, SessionStore};
use finchat_server::{AppState, ServerConfig};
use finchat_tools::ToolRegistry;
use finchat_utils::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "finchat-server")]
#[command(about = "Stock data and chat HTTP service backed by Gemini", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = finchat_server::config::DEFAULT_BIND)]
    bind: SocketAddr,

    /// Gemini model used for chat turns
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Idle seconds before a chat session is dropped
    #[arg(long, env = "SESSION_TTL_SECS", default_value_t = 1800)]
    session_ttl_secs: u64,

    /// Maximum model calls per chat turn
    #[arg(long, env = "MAX_TOOL_ITERATIONS", default_value_t = 8)]
    max_iterations: usize,

    /// Do not send permissive CORS headers
    #[arg(long)]
    no_cors: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = Config::from_env();
    finchat_utils::init_tracing(app_config.json_logs);

    let args = Args::parse();
    info!(
        app = %app_config.app_name,
        environment = %app_config.environment,
        model = %args.model,
        "Starting finchat server"
    );

    let provider = Arc::new(
        GeminiProvider::from_env().context("Gemini API key missing (set geminiAPI)")?,
    );

    let gateway: Arc<dyn MarketDataGateway> =
        Arc::new(YahooGateway::new(MarketConfig::from_env()?)?);

    let registry = ToolRegistry::new();
    register_market_tools(&registry, Arc::clone(&gateway));
    let instruction = system_instruction(&registry.names())?;
    info!(tools = registry.len(), "Tools registered");

    let executor = AgentExecutor::builder()
        .provider(provider)
        .tool_registry(Arc::new(registry))
        .model(args.model)
        .max_iterations(args.max_iterations)
        .system_prompt(instruction)
        .build()?;

    let server_config = ServerConfig::default()
        .with_bind(args.bind)
        .with_cors(!args.no_cors)
        .with_session_ttl(Duration::from_secs(args.session_ttl_secs));

    let sessions = Arc::new(SessionStore::new(server_config.session_ttl));
    let bridge = Arc::new(ConversationBridge::new(Arc::new(executor), sessions));

    finchat_server::serve(server_config, AppState::new(bridge, gateway)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_is_served() {
        let args = Args::try_parse_from(["finchat-server"]).unwrap();
        assert_eq!(args.model, "gemini-2.5-flash");
        assert_eq!(args.session_ttl_secs, 1800);
    }
}
