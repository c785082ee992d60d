use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use isp_chat_http::{AppState, create_router};
use isp_chat_isp::{IspClient, IspConfig};
use isp_chat_llm::{IspAgent, LlmClient, LlmConfig};
use isp_chat_service::{ChatService, HistoryService, ServiceConfig};

use crate::open_storage;

pub(crate) async fn run(port: u16, host: String) -> Result<()> {
    let storage = open_storage().await?;
    tracing::info!(backend = storage.kind(), "Storage ready");

    let llm = LlmClient::new(LlmConfig::from_env()?)?;
    let isp = IspClient::new(IspConfig::from_env())?;
    tracing::info!(model = llm.model(), isp_api = isp.base_url(), "Assistant configured");

    let config = ServiceConfig::from_env();
    let chat_service = Arc::new(ChatService::new(
        Arc::clone(&storage),
        Arc::new(IspAgent::new(llm, isp)),
        config,
    ));
    let history_service = Arc::new(HistoryService::new(storage));
    let router = create_router(Arc::new(AppState { chat_service, history_service }));

    let addr = format!("{host}:{port}");
    tracing::info!(history_depth = config.history_depth, "Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}
