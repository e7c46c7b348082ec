use anyhow::Context;
use clap::Parser;
use opscenter_audit::{AuditLogger, AuditStorage, ConsoleStorage, TeeStorage};
use opscenter_blob::BlobStore;
use opscenter_bridge::HttpBridgeClient;
use opscenter_core::GatewayConfig;
use opscenter_gateway::{AppServices, AppState};
use opscenter_policy::ToolAllowList;
use opscenter_search::{UnintegratedSearch, VertexImporter};
use opscenter_store::{PgAuditStorage, PgDocRepository, connect_with_retry, run_migrations};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "opscenter-gateway", version, about = "SME Ops-Center API gateway")]
struct Args {
    /// TOML configuration file. Environment variables override its values.
    #[arg(short, long, env = "OPSCENTER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = GatewayConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    let pool = connect_with_retry(&cfg.database)
        .await
        .context("Database not ready")?;
    run_migrations(&pool).await.context("Migrations failed")?;

    let pg_audit: Arc<dyn AuditStorage> = Arc::new(PgAuditStorage::new(pool.clone()));
    let audit_storage: Arc<dyn AuditStorage> = if cfg.audit.stdout {
        Arc::new(TeeStorage::new(pg_audit, Arc::new(ConsoleStorage)))
    } else {
        pg_audit
    };

    let blobs = BlobStore::from_config(&cfg.storage).context("Failed to set up upload storage")?;
    let smoke_bucket = match cfg.storage.gcs_bucket.as_deref() {
        Some(bucket) => Some(BlobStore::gcs(bucket).context("Failed to set up GCS bucket")?),
        None => None,
    };
    if !cfg.search.is_configured() {
        tracing::warn!("Vertex AI Search not configured; indexing will fail per document");
    }

    let services = AppServices {
        docs: Arc::new(PgDocRepository::new(pool)),
        audit: AuditLogger::new(audit_storage),
        blobs,
        smoke_bucket,
        importer: Arc::new(
            VertexImporter::new(cfg.search.clone()).context("Failed to build search importer")?,
        ),
        search: Arc::new(UnintegratedSearch),
        bridge: Arc::new(
            HttpBridgeClient::from_config(&cfg.bridge).context("Failed to build bridge client")?,
        ),
        allow_list: ToolAllowList::default(),
    };
    let app = opscenter_gateway::app(AppState::new(services), &cfg.server);

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.server.bind))?;
    tracing::info!(
        bind = %cfg.server.bind,
        storage = ?cfg.storage.backend,
        bridge = %cfg.bridge.url,
        "opscenter-gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("opscenter-gateway shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
