//! Command implementations: config loading, engine wiring, extraction runs.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use decant_common::state::FileStateStore;
use decant_common::{
    OAuthClient, OAuthConfig, StateStore, TokenManager, WorkerPool, WorkerPoolConfig,
};
use decant_core::ExtractionService;
use decant_domain::config::{Config, StateBackendConfig};
use decant_domain::constants::DEFAULT_WINDOW_DAYS;
use decant_domain::{DateWindow, ExtractionError, ResourceKind, ResourceSpec};
use decant_infra::{ApiClient, LocalDirStore, ReportWriter, VaultStateStore};
use tracing::info;

use crate::cli::{AuthorizeArgs, RunArgs, WindowArgs};

/// Extract all configured resources, or the one named in `args`.
///
/// Windowed resources get the default trailing window so a plain
/// `decant run` covers the whole catalogue. Per-id failures end up in the
/// report; only run-level errors abort.
pub async fn run(config_path: Option<PathBuf>, args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let selected = select_resources(&config, args.resource.as_deref())?;
    let engine = Engine::connect(&config).await?;

    for spec in selected {
        let window = (spec.kind == ResourceKind::Windowed)
            .then(|| DateWindow::last_days(DEFAULT_WINDOW_DAYS));
        engine.extract_one(&spec, window.as_ref()).await?;
    }
    Ok(())
}

/// Extract date-windowed resources over an explicit or trailing window.
pub async fn window(config_path: Option<PathBuf>, args: WindowArgs) -> anyhow::Result<()> {
    let window = resolve_window(&args)?;
    let config = load_config(config_path)?;
    let selected = select_windowed(&config, args.resource.as_deref())?;
    let engine = Engine::connect(&config).await?;

    info!(
        start = %window.start_param(),
        end = %window.end_param(),
        resources = selected.len(),
        "Windowed extraction starting"
    );
    for spec in selected {
        engine.extract_one(&spec, Some(&window)).await?;
    }
    Ok(())
}

/// Exchange a one-time authorization code and persist the refresh token.
///
/// The code is obtained out of band from the provider's consent screen;
/// this is the only way to seed an empty state store.
pub async fn authorize(config_path: Option<PathBuf>, args: AuthorizeArgs) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = open_state_store(&config.auth.state).await?;
    let client = OAuthClient::new(oauth_config(&config));

    let response = client
        .exchange_authorization_code(&args.code)
        .await
        .context("authorization code exchange failed")?;
    let refresh_token = response.refresh_token.ok_or_else(|| {
        ExtractionError::Auth("authorization grant did not include a refresh token".to_string())
    })?;

    store
        .set(&config.auth.refresh_token_key, &refresh_token)
        .await
        .map_err(|e| ExtractionError::State(e.to_string()))?;

    println!("Refresh token stored under '{}'", config.auth.refresh_token_key);
    Ok(())
}

/// A connected extraction engine plus the artifact writer it reports to.
struct Engine {
    service: ExtractionService,
    writer: ReportWriter,
}

impl Engine {
    /// Wire the engine from configuration and authenticate up front, so a
    /// missing or rejected refresh token fails before any extraction work.
    async fn connect(config: &Config) -> anyhow::Result<Self> {
        let store = open_state_store(&config.auth.state).await?;
        let manager = TokenManager::new(
            OAuthClient::new(oauth_config(config)),
            store,
            config.auth.refresh_token_key.clone(),
        );
        manager.initialize().await.context("authentication startup failed")?;

        let client = ApiClient::new(&config.api, Arc::new(manager))?;
        let pool_config = WorkerPoolConfig::builder()
            .workers(config.extraction.workers)
            .build()
            .map_err(ExtractionError::Config)?;
        let pool = WorkerPool::new(pool_config).map_err(ExtractionError::Config)?;

        let service = ExtractionService::new(Arc::new(client), pool)
            .with_page_limit(config.api.page_limit)
            .with_batch_size(config.extraction.batch_size)
            .with_retry_max_attempts(config.extraction.retry_max_attempts);
        let writer = ReportWriter::new(
            Arc::new(LocalDirStore::new(config.output.dir.clone())),
            config.output.format,
        );

        Ok(Self { service, writer })
    }

    async fn extract_one(
        &self,
        spec: &ResourceSpec,
        window: Option<&DateWindow>,
    ) -> anyhow::Result<()> {
        let report = self.service.extract(spec, window).await?;
        let artifact = self.writer.write(&report).await?;

        println!(
            "{}: {} records extracted, {} failed, artifact {artifact}",
            spec.name,
            report.metadata.successful_extractions,
            report.metadata.failed_extractions,
        );
        if report.metadata.failed_extractions > 0 {
            let ids: Vec<String> = report.permanent_failures().map(ToString::to_string).collect();
            println!("  permanently failed ids: {}", ids.join(", "));
        }
        Ok(())
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config, ExtractionError> {
    match path {
        Some(path) => decant_infra::config::load_from_file(Some(path)),
        None => decant_infra::config::load(),
    }
}

fn oauth_config(config: &Config) -> OAuthConfig {
    OAuthConfig::new(
        config.auth.token_url.clone(),
        config.auth.client_id.clone(),
        config.auth.client_secret.clone(),
    )
}

async fn open_state_store(
    backend: &StateBackendConfig,
) -> Result<Arc<dyn StateStore>, ExtractionError> {
    match backend {
        StateBackendConfig::File { path } => {
            let store = FileStateStore::open(path)
                .await
                .map_err(|e| ExtractionError::State(e.to_string()))?;
            Ok(Arc::new(store))
        }
        StateBackendConfig::Vault { addr, mount, token } => {
            let store = VaultStateStore::new(addr, mount, token)
                .map_err(|e| ExtractionError::State(e.to_string()))?;
            Ok(Arc::new(store))
        }
    }
}

fn resolve_window(args: &WindowArgs) -> Result<DateWindow, ExtractionError> {
    match (&args.from, &args.to) {
        (Some(from), Some(to)) => DateWindow::parse(from, to),
        _ => Ok(DateWindow::last_days(args.days)),
    }
}

fn select_resources(
    config: &Config,
    name: Option<&str>,
) -> Result<Vec<ResourceSpec>, ExtractionError> {
    let catalogue = &config.extraction.resources;
    if catalogue.is_empty() {
        return Err(ExtractionError::Config("no resources configured".to_string()));
    }
    match name {
        Some(name) => catalogue
            .iter()
            .find(|spec| spec.name == name)
            .cloned()
            .map(|spec| vec![spec])
            .ok_or_else(|| ExtractionError::Config(format!("unknown resource '{name}'"))),
        None => Ok(catalogue.clone()),
    }
}

fn select_windowed(
    config: &Config,
    name: Option<&str>,
) -> Result<Vec<ResourceSpec>, ExtractionError> {
    let selected: Vec<ResourceSpec> = select_resources(config, name)?
        .into_iter()
        .filter(|spec| spec.kind == ResourceKind::Windowed)
        .collect();
    if selected.is_empty() {
        return Err(ExtractionError::InvalidInput(match name {
            Some(name) => format!("resource '{name}' does not take a date window"),
            None => "no date-windowed resources configured".to_string(),
        }));
    }
    Ok(selected)
}
