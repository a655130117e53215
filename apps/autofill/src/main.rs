mod config;
mod db;
mod dom;
mod errors;
mod fill;
mod form;
mod llm_client;
mod matching;
mod models;
mod profile;
mod resume;
mod routes;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::fill::orchestrator::FillDeps;
use crate::fill::sessions::SessionRegistry;
use crate::form::applier::DomApplier;
use crate::llm_client::LlmClient;
use crate::matching::{FieldMatcher, LlmFieldMatcher};
use crate::profile::store::{ProfileStore, RedisProfileStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting autofill v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (resume metadata)
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize Redis (profiles)
    let redis = redis::Client::open(config.redis_url.clone())?;
    let profiles: Arc<dyn ProfileStore> = Arc::new(RedisProfileStore::new(redis));
    info!("Redis profile store initialized");

    // Initialize S3 / MinIO (resume files)
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Initialize LLM client and the matcher on top of it
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let matcher: Arc<dyn FieldMatcher> = Arc::new(LlmFieldMatcher::new(Arc::new(llm)));

    let deps = FillDeps {
        profiles: profiles.clone(),
        matcher: matcher.clone(),
        applier: Arc::new(DomApplier),
        match_timeout: config.match_timeout,
    };
    let sessions = Arc::new(SessionRegistry::new(
        deps,
        config.notification_ttl,
        config.session_idle_ttl,
    ));
    info!(
        "Fill sessions ready (match timeout {:?}, notification ttl {:?}, idle ttl {:?})",
        config.match_timeout, config.notification_ttl, config.session_idle_ttl
    );

    // Build app state
    let state = AppState {
        db,
        s3,
        config: config.clone(),
        profiles,
        matcher,
        sessions,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        // TODO: restrict origins to the extension id once it is published
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "autofill-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not by virtual host.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
