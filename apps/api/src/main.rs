mod applications;
mod config;
mod db;
mod errors;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::applications::pg_store::PgApplicationStore;
use crate::applications::storage::{LocalDiskStorage, ResumeStorage, S3Storage};
use crate::applications::store::{ApplicationStore, MemoryApplicationStore};
use crate::config::{Config, S3Config, StorageBackend};
use crate::db::{create_pool, run_migrations};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // A half-configured storage backend fails here, before anything binds.
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Job Application API v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState {
        store: open_store(&config).await?,
        files: open_resume_storage(&config).await?,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}, applications under {}", config.base_path);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn open_store(config: &Config) -> Result<Arc<dyn ApplicationStore>> {
    let Some(url) = &config.database_url else {
        warn!("DATABASE_URL not set; applications are kept in memory only");
        return Ok(Arc::new(MemoryApplicationStore::new()));
    };
    let pool = create_pool(url).await?;
    run_migrations(&pool).await?;
    Ok(Arc::new(PgApplicationStore::new(pool)))
}

async fn open_resume_storage(config: &Config) -> Result<Arc<dyn ResumeStorage>> {
    match &config.storage {
        StorageBackend::Local { upload_dir } => {
            let local = LocalDiskStorage::new(upload_dir).await?;
            info!("Storing resumes under {}", local.root().display());
            Ok(Arc::new(local))
        }
        StorageBackend::S3(s3) => {
            info!("Storing resumes in bucket {} at {}", s3.bucket, s3.endpoint);
            let client = build_s3_client(s3).await;
            Ok(Arc::new(S3Storage::new(client, s3.bucket.clone())))
        }
    }
}

/// S3 client with static credentials. Path-style addressing keeps MinIO
/// endpoints working.
async fn build_s3_client(s3: &S3Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &s3.access_key_id,
        &s3.secret_access_key,
        None,
        None,
        "jobapply-static",
    );

    let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&s3.endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&shared)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
