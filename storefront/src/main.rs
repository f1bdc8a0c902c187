use anyhow::Context;
use storefront::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;
    init_tracing(&config)?;

    let state = AppState::connect(config.clone())
        .await
        .context("connecting the document store")?;
    let app = build_router(state).context("building the router")?;

    Server::new(config).serve(app).await?;
    Ok(())
}
