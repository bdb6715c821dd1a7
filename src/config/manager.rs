//! Priority-ordered source selection.

use super::source::Source;
use super::types::Config;
use super::validate::Validator;
use super::watcher::{NotifyOutcome, WatchSession};
use crate::error::{ConfigError, ConfigResult, SourceFailure};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A loaded value together with the name of the source that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub config: T,
    pub source: String,
}

struct ManagerState<T> {
    sources: Vec<Arc<Source>>,
    validator: Option<Arc<dyn Validator<T>>>,
    session: Option<WatchSession>,
}

/// Holds an ordered set of sources and resolves a value from the first one
/// that is available and loads cleanly.
///
/// Sources are never merged with each other: the highest-priority source that
/// succeeds supplies the whole value.
pub struct ConfigManager<T = Config> {
    state: RwLock<ManagerState<T>>,
}

impl<T> Default for ConfigManager<T> {
    fn default() -> Self {
        Self {
            state: RwLock::new(ManagerState {
                sources: Vec::new(),
                validator: None,
                session: None,
            }),
        }
    }
}

impl<T> std::fmt::Debug for ConfigManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ConfigManager")
            .field("sources", &state.sources)
            .field("has_validator", &state.validator.is_some())
            .field("watching", &state.session.as_ref().is_some_and(|s| s.is_active()))
            .finish()
    }
}

impl<T: DeserializeOwned> ConfigManager<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source. Equal priorities keep insertion order.
    pub fn add_source(&self, source: Source) {
        let mut state = self.state.write();
        debug!(
            source = %source.name(),
            priority = source.priority(),
            "Adding configuration source"
        );
        state.sources.push(Arc::new(source));
        state
            .sources
            .sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// Attach or clear the validator run against every loaded value.
    pub fn set_validator(&self, validator: Option<Arc<dyn Validator<T>>>) {
        self.state.write().validator = validator;
    }

    /// Resolve a value from the highest-priority source that loads.
    pub fn load_config(&self) -> ConfigResult<Resolved<T>> {
        let (sources, validator) = {
            let state = self.state.read();
            (state.sources.clone(), state.validator.clone())
        };

        let mut failures = Vec::new();
        for source in &sources {
            if !source.is_available() {
                debug!(source = %source.name(), "Source unavailable, skipping");
                continue;
            }

            match source.load::<T>() {
                Ok(config) => {
                    if let Some(validator) = &validator {
                        validator.validate(&config)?;
                    }
                    info!(source = %source.name(), "Loaded configuration");
                    return Ok(Resolved {
                        config,
                        source: source.name(),
                    });
                }
                Err(e) => {
                    warn!(
                        source = %source.name(),
                        error = %e,
                        "Failed to load configuration source"
                    );
                    failures.push(SourceFailure {
                        source: source.name(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if failures.is_empty() {
            Err(ConfigError::NoSourcesAvailable)
        } else {
            Err(ConfigError::AllSourcesFailed(failures))
        }
    }

    /// Registered sources that are currently available, highest priority first.
    pub fn active_sources(&self) -> Vec<Arc<Source>> {
        let sources = self.sources();
        sources.into_iter().filter(|s| s.is_available()).collect()
    }

    /// Every registered source, highest priority first.
    pub fn sources(&self) -> Vec<Arc<Source>> {
        self.state.read().sources.clone()
    }

    /// Begin watching. `callback` runs on a background thread for each
    /// change signalled through [`notify_change`](Self::notify_change).
    pub fn watch<F>(&self, callback: F) -> ConfigResult<()>
    where
        F: FnMut() + Send + 'static,
    {
        let mut state = self.state.write();
        if state.session.as_ref().is_some_and(|s| s.is_active()) {
            return Err(ConfigError::AlreadyWatching);
        }
        let session = WatchSession::start(callback).map_err(ConfigError::WatchSpawn)?;
        state.session = Some(session);
        Ok(())
    }

    /// Stop watching. Calling this when not watching does nothing.
    pub fn stop_watching(&self) {
        let session = self.state.write().session.take();
        if let Some(mut session) = session {
            session.stop();
        }
    }

    pub fn is_watching(&self) -> bool {
        self.state
            .read()
            .session
            .as_ref()
            .is_some_and(|s| s.is_active())
    }

    /// Signal a configuration change to the active watch, if any.
    pub fn notify_change(&self) -> NotifyOutcome {
        match &self.state.read().session {
            Some(session) => session.notify(),
            None => NotifyOutcome::Inactive,
        }
    }
}
