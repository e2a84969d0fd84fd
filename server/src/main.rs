use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use ticketing_client::{RpcLedger, TicketingApi, TicketingClient};
use ticketing_server::{configure, Mirror, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    let default_level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    config.validate()?;
    let client = config.client.connect().context("failed to set up client")?;
    info!(
        bind = %config.bind,
        chain = %config.client.chain,
        wallet = %TicketingApi::wallet(&client),
        "starting ticketing server"
    );

    let mirror = web::Data::new(Mirror::new(client, config.probe_window));
    HttpServer::new(move || {
        App::new()
            .app_data(mirror.clone())
            .wrap(middleware::Logger::default())
            .configure(configure::<TicketingClient<RpcLedger>>)
    })
    .bind(config.bind)?
    .run()
    .await?;

    Ok(())
}
