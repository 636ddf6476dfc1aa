use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod state;

use datasearch_backend::config;
use datasearch_backend::db;
use datasearch_backend::store::RecordStore;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "datasearch_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config().map_err(anyhow::Error::msg)?;
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);

    // Create data directory if not exists / 创建数据目录
    let data_dir = app_config.get_data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory: {:?}", data_dir);
    }

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| app_config.get_database_url());

    let pool = db::connect(&database_url, app_config.database.max_connections).await?;
    let store = Arc::new(RecordStore::open(pool).await?);

    // Repair rows imported without derived text / 修复缺失的搜索文本
    store.rebuild_searchable_text().await?;

    if !store.fulltext_available() {
        tracing::warn!("Full-text index unavailable, searches use substring matching only");
    }
    if app_config.admin.api_token.is_empty() {
        tracing::warn!("admin.api_token is empty, admin endpoints are unprotected");
    }

    let bind_addr = app_config.get_bind_address();
    let state = Arc::new(AppState::new(store.clone(), app_config));

    let app = Router::new()
        .route("/api/health", get(api::server::health_check))
        .route("/api/search", post(api::search::search))
        .route("/api/search/columns", get(api::search::list_columns))
        .route("/api/records/:id", get(api::records::get_record))
        // 管理API
        .route("/api/admin/records", get(api::records::list_records))
        .route("/api/admin/records", post(api::records::save_record))
        .route("/api/admin/records/:id/field", post(api::records::set_field))
        .route("/api/admin/records/:id/delete", post(api::records::delete_record))
        .route("/api/admin/import", post(api::import::import_rows))
        .route("/api/admin/import/validate", post(api::import::validate))
        .route("/api/admin/clear", post(api::admin::clear_records))
        .route("/api/admin/stats", get(api::admin::get_stats))
        .route("/api/admin/export", get(api::admin::export_records))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    store.close().await;
    Ok(())
}
