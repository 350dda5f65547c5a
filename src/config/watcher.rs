//! Route table reloads driven by config file changes.
//!
//! # Design Decisions
//! - Only the `[[routes]]` section is hot; other settings need a restart
//! - Editors fire several events per save; unchanged route sets are dropped
//! - A broken file keeps the current table and logs why

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::RouteConfig;
use crate::routing::{RouteSet, RoutingError};

/// Why a changed file did not produce a new route table.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Routes(#[from] RoutingError),
}

/// Watches the config file and sends freshly compiled route tables.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RouteSet>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end for new route tables.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RouteSet>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching in the background.
    ///
    /// Updates stop when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let watched = path.clone();
        let last = Mutex::new(load_routes(&path).ok());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = %e, "Config watch failed");
                        return;
                    }
                };
                if !(event.kind.is_modify() || event.kind.is_create()) {
                    return;
                }

                let configs = match load_routes(&path) {
                    Ok(configs) => configs,
                    Err(e) => {
                        tracing::error!(error = %e, "Config reload rejected, keeping current routes");
                        return;
                    }
                };
                let mut last = match last.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                if last.as_ref() == Some(&configs) {
                    tracing::trace!(path = %path.display(), "Routes unchanged");
                    return;
                }

                match RouteSet::from_config(&configs) {
                    Ok(routes) => {
                        tracing::info!(path = %path.display(), routes = routes.len(), "Routes changed");
                        *last = Some(configs);
                        let _ = update_tx.send(routes);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Config reload rejected, keeping current routes")
                    }
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watched, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %watched.display(), "Watching config for route changes");
        Ok(watcher)
    }
}

/// Load `path` and compile its routes, as a reload would.
pub fn reload_routes(path: &Path) -> Result<RouteSet, ReloadError> {
    let configs = load_routes(path)?;
    Ok(RouteSet::from_config(&configs)?)
}

fn load_routes(path: &Path) -> Result<Vec<RouteConfig>, ConfigError> {
    Ok(load_config(path)?.routes)
}
