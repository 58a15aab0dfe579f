use axum::{
    routing::{get, post},
    Router,
};
use http::{HeaderName, HeaderValue};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    accounts::handlers::{get_dashboard, register_account},
    api::handler::{health_check, AppState},
    settlement::handlers::verify_task,
    slots::handlers::{cancel_task, start_task},
    tasks::handlers::{
        create_task, delete_task, get_task_log, list_tasks, my_tasks, pause_task, publish_task,
        report_task,
    },
    wallet::handlers::get_wallet,
};

pub async fn create_app(state: AppState) -> Router {
    info!("setting up HTTP routes");

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/accounts", post(register_account))
        .route("/dashboard", get(get_dashboard))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/mine", get(my_tasks))
        .route("/tasks/:id/start", get(start_task))
        .route("/tasks/:id/cancel", get(cancel_task))
        .route("/tasks/:id/pause", get(pause_task))
        .route("/tasks/:id/publish", get(publish_task))
        .route("/tasks/:id/delete", get(delete_task))
        .route("/tasks/:id/report", post(report_task))
        .route("/tasks/:id/:unique_id/verify", get(verify_task))
        .route("/wallet", get(get_wallet))
        .route("/tasklog", get(get_task_log))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::very_permissive())
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                )),
        )
        .with_state(state);

    info!("HTTP routes configured");
    app
}

pub async fn run_server(app: Router, bind_address: &str) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("server listening on {bind_address}");

    axum::serve(listener, app).await?;
    Ok(())
}
