mod app;
mod auth;
mod config;
mod error;
mod records;
mod state;
mod store;
mod telemetry;

use crate::{
    config::{AppConfig, LogConfig},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init(&LogConfig::from_env());

    let config = AppConfig::from_env()?;
    let addr = config.server.listen_addr;
    let state = AppState::init(config).await?;

    app::serve(app::build_app(state), addr).await
}
