use std::path::PathBuf;
use std::sync::Arc;

use shopreel_generation::{GenerationClient, PollingClient, StubProvider};
use shopreel_infra::{
    assets::{AssetStore, FilesystemAssetStore, InMemoryAssetStore},
    content::{Catalog, InMemoryCatalog},
    jobs::{
        ExecutionContext, InMemoryJobStore, JobOrchestrator, JobStore, OrchestratorHandle,
    },
    OrchestratorConfig,
};

#[cfg(feature = "postgres")]
use shopreel_infra::jobs::postgres::PostgresJobStore;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_ASSET_BASE_URL: &str = "http://localhost:8080/assets";

/// Process settings read by the binary.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: String,
    pub asset_dir: Option<PathBuf>,
    pub asset_base_url: String,
    pub database_url: Option<String>,
    pub orchestrator: OrchestratorConfig,
}

impl Settings {
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            bind: var("SHOPREEL_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            asset_dir: var("SHOPREEL_ASSET_DIR").map(PathBuf::from),
            asset_base_url: var("SHOPREEL_ASSET_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ASSET_BASE_URL.to_string()),
            database_url: var("DATABASE_URL"),
            orchestrator: OrchestratorConfig::from_env(),
        }
    }
}

/// Everything the handlers need.
pub struct AppServices {
    pub orchestrator: JobOrchestrator,
    pub catalog: Arc<dyn Catalog>,
}

impl AppServices {
    /// Start the orchestrator's dispatcher and bundle it with the catalog.
    pub fn start(ctx: ExecutionContext, catalog: Arc<dyn Catalog>) -> (Arc<Self>, OrchestratorHandle) {
        let (orchestrator, handle) = JobOrchestrator::spawn(ctx);
        (
            Arc::new(Self {
                orchestrator,
                catalog,
            }),
            handle,
        )
    }
}

/// Wire stores, provider and orchestrator from `settings`.
pub async fn build_services(
    settings: &Settings,
) -> anyhow::Result<(Arc<AppServices>, OrchestratorHandle)> {
    let store = build_job_store(settings).await?;

    let assets: Arc<dyn AssetStore> = match &settings.asset_dir {
        Some(dir) => {
            tracing::info!(root = %dir.display(), "using filesystem asset store");
            Arc::new(FilesystemAssetStore::new(dir, settings.asset_base_url.as_str()))
        }
        None => {
            tracing::warn!("SHOPREEL_ASSET_DIR not set; assets are kept in memory");
            Arc::new(InMemoryAssetStore::new())
        }
    };

    tracing::warn!("no generation provider configured; using the stub provider");
    let client: Arc<dyn GenerationClient> = Arc::new(PollingClient::new(
        StubProvider::default(),
        settings.orchestrator.poll(),
    ));

    let ctx = ExecutionContext {
        store,
        client,
        assets,
        config: settings.orchestrator.clone(),
    };
    Ok(AppServices::start(ctx, Arc::new(InMemoryCatalog::with_defaults())))
}

#[cfg(feature = "postgres")]
async fn build_job_store(settings: &Settings) -> anyhow::Result<Arc<dyn JobStore>> {
    match &settings.database_url {
        Some(url) => {
            let pool = sqlx::PgPool::connect(url).await?;
            let store = PostgresJobStore::new(pool);
            store.ensure_schema().await?;
            tracing::info!("using postgres job store");
            let store: Arc<dyn JobStore> = Arc::new(store);
            Ok(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; jobs are kept in memory");
            let store: Arc<dyn JobStore> = InMemoryJobStore::arc();
            Ok(store)
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn build_job_store(settings: &Settings) -> anyhow::Result<Arc<dyn JobStore>> {
    if settings.database_url.is_some() {
        tracing::warn!("DATABASE_URL ignored: built without the `postgres` feature");
    }
    let store: Arc<dyn JobStore> = InMemoryJobStore::arc();
    Ok(store)
}
