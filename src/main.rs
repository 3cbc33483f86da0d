use dotenvy::dotenv;
use lestari::logging::init_tracing;
use lestari::router::init_router;
use lestari::state::init_app_state;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing()?;

    let state = init_app_state().await?;
    let bind_address = state.server_config.bind_address();
    let app = init_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server running on http://{}", bind_address);
    info!("OpenAPI document at http://{}/api-docs/openapi.json", bind_address);
    axum::serve(listener, app).await?;

    Ok(())
}
