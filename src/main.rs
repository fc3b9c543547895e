use lww_gossip::config::{NodeConfig, init_logging};
use lww_gossip::node::NodeHandle;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NodeConfig::load()?;
    let _log_guard = init_logging(&config)?;

    tracing::info!("Starting lww-node on {}", config.bind_addr());

    let node = NodeHandle::start(config).await?;

    tracing::info!("Node listening on {}", node.local_addr());
    tracing::info!("Press Ctrl+C to shutdown");

    tokio::signal::ctrl_c().await?;
    node.shutdown().await?;

    Ok(())
}
