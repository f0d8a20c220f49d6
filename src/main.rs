use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use etf_informer::assistant::AssistantService;
use etf_informer::config::Config;
use etf_informer::http::{self, AppState};
use etf_informer::media::MediaStore;
use etf_informer::search::EtfSearchClient;
use etf_informer::session::SessionStore;
use etf_informer::tools::ToolRegistry;
use etf_informer::tools::search_etfs::SearchEtfsTool;
use etf_informer::transport::AzureOpenAiTransport;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;

    let transport = Arc::new(AzureOpenAiTransport::new(
        &config.assistant.endpoint,
        &config.assistant.api_key,
        &config.assistant.api_version,
    ));

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SearchEtfsTool::new(
        EtfSearchClient::new(config.search.endpoint.clone()),
        config.search.default_entries,
    )));
    let registry = Arc::new(registry);

    let media = MediaStore::new(&config.server.static_dir, &config.server.public_base_url);
    media.ensure_dir().await?;

    let assistant = AssistantService::new(transport, registry, media, &config).await?;

    let state = Arc::new(AppState {
        assistant: Arc::new(assistant),
        sessions: SessionStore::new(),
    });
    let app = http::router(state, &config.server.static_dir);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("Listening on http://{}", config.server.bind);
    axum::serve(listener, app).await?;
    Ok(())
}
