use std::net::SocketAddr;

use anyhow::Context;

use nova_infra::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    nova_observability::init();

    let config = Config::from_env().context("invalid configuration")?;
    let bind_address = config.bind_address.clone();

    let app = nova_api::app::build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
