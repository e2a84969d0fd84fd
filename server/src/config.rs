use std::net::SocketAddr;

use clap::Parser;
use ticketing_client::ClientConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "ticketing-server")]
#[command(about = "HTTP backend for confidential event ticketing", long_about = None)]
pub struct ServerConfig {
    #[command(flatten)]
    pub client: ClientConfig,

    /// Listen address
    #[arg(long, env = "TICKETING_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Highest id probed on the chain when a listing is not cached
    #[arg(long, env = "TICKETING_PROBE_WINDOW", default_value_t = 32)]
    pub probe_window: u64,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.probe_window > 0, "probe window must be at least 1");
        self.client.validate()?;
        Ok(())
    }
}
