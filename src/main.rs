mod accounts;
mod api;
mod bootstrap;
mod config;
mod email;
mod error;
mod middleware;
mod referral;
mod server;
mod settlement;
mod slots;
mod store;
mod tasks;
mod wallet;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,server=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    dotenv::dotenv().ok();
    let config = config::Config::from_env()?;

    let state = bootstrap::initialize_app_state(&config).await;
    let app = server::create_app(state).await;

    server::run_server(app, &config.bind_address).await?;

    Ok(())
}
