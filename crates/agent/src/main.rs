//! Codetrail - standalone activity agent
//!
//! Starts the agent, keeps the tracking scheduler running until Ctrl-C, then
//! shuts down with a final flush. IDE hosts embed the library instead.

use codetrail_agent::utils::logging::{init_logging, load_dotenv};
use codetrail_agent::AgentContext;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging first so .env loading is visible
    let json = std::env::var("CODETRAIL_LOG_JSON").is_ok_and(|value| value == "1" || value == "true");
    init_logging(json);
    load_dotenv();

    let config = codetrail_infra::config::load_or_default()?;
    let ctx = AgentContext::start(config).await?;
    info!(root = %ctx.paths.root().display(), "Codetrail agent running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    ctx.shutdown().await;
    Ok(())
}
