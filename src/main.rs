use std::sync::Arc;

use cineswipe_api::api::{create_router, AppState};
use cineswipe_api::config::Config;
use cineswipe_api::services::{providers::TmdbCatalog, FeedPipeline};
use cineswipe_api::store::{
    create_pool, create_redis_client, Cache, PersistenceBridge, PgProfileStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cineswipe_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db_pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, _cache_writer) = Cache::new(redis_client).await;

    let catalog = TmdbCatalog::new(
        config.catalog_api_key.clone(),
        config.catalog_api_url.clone(),
        config.catalog_language.clone(),
    );
    let pipeline = FeedPipeline::new(Arc::new(catalog));
    let bridge = PersistenceBridge::new(Arc::new(PgProfileStore::new(db_pool)), cache);

    let state = AppState::new(pipeline, bridge);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Discovery feed service listening");
    axum::serve(listener, app).await?;

    Ok(())
}
