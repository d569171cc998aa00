//! Post-load and pre-save hooks over raw map documents.
//!
//! Hooks let collaborators (migrations, plugins) rewrite a document right
//! after it is read and right before it is written. Each list runs in
//! registration order; every hook receives the previous hook's output.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use crate::raw::RawMapFile;
use crate::MapError;

/// Boxed future returned by a [`MapHook`].
pub type HookFuture = Pin<Box<dyn Future<Output = anyhow::Result<RawMapFile>> + Send>>;

/// A document rewrite step.
pub type MapHook = Box<dyn Fn(RawMapFile) -> HookFuture + Send + Sync>;

/// Which hook list is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    PostLoad,
    PreSave,
}

/// Ordered hook lists for loading and saving maps.
#[derive(Default)]
pub struct MapLifecycle {
    post_load: Vec<MapHook>,
    pre_save: Vec<MapHook>,
}

impl std::fmt::Debug for MapLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapLifecycle")
            .field("post_load", &self.post_load.len())
            .field("pre_save", &self.pre_save.len())
            .finish()
    }
}

impl MapLifecycle {
    /// No hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` on every loaded document, after the hooks already added.
    pub fn add_post_load_hook<F, Fut>(&mut self, hook: F)
    where
        F: Fn(RawMapFile) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<RawMapFile>> + Send + 'static,
    {
        self.post_load.push(box_hook(hook));
    }

    /// Run `hook` on every document about to be saved, after the hooks
    /// already added.
    pub fn add_pre_save_hook<F, Fut>(&mut self, hook: F)
    where
        F: Fn(RawMapFile) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<RawMapFile>> + Send + 'static,
    {
        self.pre_save.push(box_hook(hook));
    }

    /// Number of registered post-load hooks.
    pub fn post_load_hook_count(&self) -> usize {
        self.post_load.len()
    }

    /// Number of registered pre-save hooks.
    pub fn pre_save_hook_count(&self) -> usize {
        self.pre_save.len()
    }

    /// Thread `map` through every post-load hook.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::PostLoadHook`] for the first failing hook; later
    /// hooks do not run.
    pub async fn execute_post_load(&self, map: RawMapFile) -> Result<RawMapFile, MapError> {
        run_hooks(&self.post_load, map, Phase::PostLoad).await
    }

    /// Thread `map` through every pre-save hook.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::PreSaveHook`] for the first failing hook; later
    /// hooks do not run.
    pub async fn execute_pre_save(&self, map: RawMapFile) -> Result<RawMapFile, MapError> {
        run_hooks(&self.pre_save, map, Phase::PreSave).await
    }
}

fn box_hook<F, Fut>(hook: F) -> MapHook
where
    F: Fn(RawMapFile) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<RawMapFile>> + Send + 'static,
{
    Box::new(move |map| Box::pin(hook(map)) as HookFuture)
}

async fn run_hooks(
    hooks: &[MapHook],
    mut map: RawMapFile,
    phase: Phase,
) -> Result<RawMapFile, MapError> {
    for (index, hook) in hooks.iter().enumerate() {
        map = match hook(map).await {
            Ok(map) => map,
            Err(source) => {
                warn!(?phase, index, error = %source, "map hook failed");
                return Err(match phase {
                    Phase::PostLoad => MapError::PostLoadHook { index, source },
                    Phase::PreSave => MapError::PreSaveHook { index, source },
                });
            }
        };
    }
    if !hooks.is_empty() {
        debug!(?phase, hooks = hooks.len(), "map hooks applied");
    }
    Ok(map)
}
