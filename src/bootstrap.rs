//! App wiring: pick the backend, load the store, build the controllers.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::info;
use tokio::sync::mpsc;

use crate::autosave::{AutosaveNotice, NoteAutosave};
use crate::config::{AppConfig, BackendConfig};
use crate::confirm::{DeleteGate, ObstacleTarget, TrickTarget};
use crate::domain::{DomainError, DomainResult, LaneSelection};
use crate::repository::{PersistenceAdapter, ResourceStore, SnapshotStore};
use crate::store::DomainStore;

/// Everything a presentation layer needs to drive the tracker
pub struct App {
    pub config: AppConfig,
    pub store: Arc<DomainStore>,
    pub autosave: NoteAutosave,
    pub notices: mpsc::UnboundedReceiver<AutosaveNotice>,
    pub obstacle_gate: DeleteGate<ObstacleTarget>,
    pub trick_gate: DeleteGate<TrickTarget>,
    pub lanes: LaneSelection,
}

impl App {
    /// Write pending notes before the app goes away
    pub async fn shutdown(&self) {
        self.autosave.close();
        self.autosave.flush_all().await;
        info!("Pending notes flushed");
    }
}

/// Route `log` output to the rolling file logger, when a log dir is configured
pub fn init_logging(config: &AppConfig) -> DomainResult<()> {
    let Some(dir) = config.log_dir.as_deref() else {
        return Ok(());
    };
    rolling_logger::init_logger(dir, "skate_notes").map_err(DomainError::Persistence)?;
    rolling_logger::info(&format!("Logging to {}", dir.display())).map_err(DomainError::Persistence)
}

/// Latest log lines kept in memory, oldest first
pub fn recent_log_lines() -> Vec<String> {
    rolling_logger::recent_lines()
}

pub fn build_adapter(config: &AppConfig) -> DomainResult<Arc<dyn PersistenceAdapter>> {
    let adapter: Arc<dyn PersistenceAdapter> = match &config.backend {
        BackendConfig::Snapshot { db_path } => {
            if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DomainError::Persistence(format!("Failed to create data dir: {}", e))
                })?;
            }
            Arc::new(SnapshotStore::open(db_path)?)
        }
        BackendConfig::Resource {
            base_url,
            timeout_ms,
        } => Arc::new(ResourceStore::new(
            base_url.as_str(),
            Duration::from_millis(*timeout_ms),
        )?),
    };
    Ok(adapter)
}

/// Load the collection through the configured backend and build the app
pub async fn start(config: AppConfig) -> DomainResult<App> {
    config.validate()?;
    let adapter = build_adapter(&config)?;
    start_with(config, adapter).await
}

/// Like [`start`], with an adapter supplied by the caller
pub async fn start_with(config: AppConfig, adapter: Arc<dyn PersistenceAdapter>) -> DomainResult<App> {
    let kind = adapter.kind();
    let store = Arc::new(DomainStore::open(adapter).await?);
    let (autosave, notices) = NoteAutosave::new(Arc::clone(&store), config.debounce());
    info!("Skate notes started on {} backend", kind);

    Ok(App {
        config,
        store,
        autosave,
        notices,
        obstacle_gate: DeleteGate::new(),
        trick_gate: DeleteGate::new(),
        lanes: LaneSelection::default(),
    })
}

/// Load config from `data_dir`, set up logging and start
pub async fn launch(data_dir: &Path) -> DomainResult<App> {
    let config = AppConfig::load(data_dir)?;
    init_logging(&config)?;
    start(config).await
}
