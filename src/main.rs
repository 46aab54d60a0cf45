use std::sync::Arc;

use anyhow::Context;
use triage_desk::agents::AgentGraph;
use triage_desk::cli::ConsoleRenderer;
use triage_desk::config::DeskSettings;
use triage_desk::desk::{DeskConfig, SupportDesk};
use triage_desk::hooks::support_desk_hooks;
use triage_desk::llm::AzureOpenAiProvider;
use triage_desk::logging;
use triage_desk::runtime::ChatRuntime;
use triage_desk::session::ChatSession;
use triage_desk::threads::{AgentServiceClient, ThreadService};
use triage_desk::tools::FaqLookupTool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = logging::init_logging("logs")?;

    tracing::info!("=== Support Desk Starting ===");

    let settings = DeskSettings::from_env()?;
    tracing::info!("Loaded settings: {:?}", settings);

    let llm = Arc::new(
        AzureOpenAiProvider::new(&settings.endpoint, &settings.api_key, &settings.api_version)
            .with_deployment(&settings.deployment),
    );
    let threads: Arc<dyn ThreadService> = Arc::new(AgentServiceClient::new(
        &settings.connection,
        &settings.access_token,
    ));

    let faq_tool = FaqLookupTool::new(threads.clone(), &settings.faq_agent_id);
    let graph = AgentGraph::support_desk(&settings.deployment, faq_tool);

    let config = DeskConfig::new()
        .with_max_turns(settings.max_turns)
        .with_hooks(support_desk_hooks().context("Invalid built-in hook pattern")?);
    let desk = Arc::new(SupportDesk::new(llm, graph, threads.clone(), config));

    let session = ChatSession::start(threads.as_ref(), &[settings.faq_agent_id.clone()]).await?;
    tracing::info!("Chat started with session ID: {}", session.session_id);

    let runtime = ChatRuntime::new();
    let handle = runtime
        .spawn(session, move |internals| async move { desk.run(internals).await })
        .await;

    let mut renderer = ConsoleRenderer::new(handle);
    renderer.run().await?;

    tracing::info!("=== Support Desk Shutting Down ===");

    Ok(())
}
