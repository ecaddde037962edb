use axum::{Router, Server, extract::DefaultBodyLimit, http::HeaderValue, middleware::from_fn};
use diesel::{
    PgConnection,
    r2d2::{self, ConnectionManager as DbConnectionManager},
};
use project_assistant::{
    AppState, config::Config, db::DbPool, init_tracing, middleware, routes,
    services::RecordedMediaFilesService,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    config.require_database()?;
    init_tracing(&config);

    // Initialize database
    let db_config = config.database();
    let manager = DbConnectionManager::<PgConnection>::new(&db_config.url);
    let db: DbPool = r2d2::Pool::builder()
        .max_size(db_config.max_connections)
        .min_idle(Some(db_config.min_connections))
        .connection_timeout(Duration::from_secs(db_config.connection_timeout))
        .build(manager)?;

    // 重启后不会有正在运行的转写任务
    let mut conn = db.get()?;
    RecordedMediaFilesService::reset_interrupted(&mut conn)?;
    drop(conn);

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tokio::fs::create_dir_all(&config.transcript_dir).await?;

    let addr: SocketAddr = config.server_address().parse()?;
    let cors = cors_layer(&config.server().cors_origins);
    let body_limit = config.uploads().max_bytes;

    let state = Arc::new(AppState::new(db, config));

    let app = Router::new()
        .merge(routes::create_router(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(from_fn(middleware::request_tracking_middleware));

    tracing::info!(%addr, "Server running");
    Server::bind(&addr).serve(app.into_make_service()).await?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    layer.allow_origin(origins)
}
