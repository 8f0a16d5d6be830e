//! Runnable bridge server.
//!
//! ```bash
//! GROQ_API_KEY=... cargo run --example serve
//! BRIDGE_BACKEND=crew GROQ_API_KEY=... cargo run --example serve
//! ```

use bridge_server::backends::{Backend, CrewBackend, ToolflowBackend};
use bridge_server::integrations::axum::BridgeRouter;
use bridge_server::llm::{ChatClient, LlmConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bridge_server=debug,info".into()),
        )
        .init();

    let config = LlmConfig::from_env()?;
    let client = ChatClient::new(reqwest::Client::new(), config);

    let backend_kind = std::env::var("BRIDGE_BACKEND").unwrap_or_else(|_| "toolflow".into());
    let backend: Arc<dyn Backend> = match backend_kind.as_str() {
        "crew" => Arc::new(CrewBackend::new(client)),
        "toolflow" => Arc::new(ToolflowBackend::new(client)),
        other => return Err(format!("unknown backend '{other}'").into()),
    };
    tracing::info!(backend = backend.name(), "starting bridge server");

    let app = BridgeRouter::new(backend).into_router();
    let addr = std::env::var("BRIDGE_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
