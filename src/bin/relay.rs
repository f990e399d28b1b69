use anyhow::Result;
use peppol_lookup::relay::{build_router, RelaySettings, RelayState};
use peppol_lookup::utils::logger;

#[tokio::main]
async fn main() -> Result<()> {
    logger::init_relay_logger();

    let settings = RelaySettings::from_env();
    tracing::info!(
        "Starting peppol-relay v{} for {}",
        env!("CARGO_PKG_VERSION"),
        settings.upstream_base_url
    );

    let app = build_router(RelayState::new(&settings)?);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("peppol-relay listening on http://{}", settings.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
