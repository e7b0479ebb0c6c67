use crate::error::{SyncError, TransformError};
use model::{events::EventKind, records::record::Record};
use std::{collections::HashMap, fmt, sync::Arc};

/// Business transform that can see the original source record.
///
/// Plugins run after declarative conversions and may only mutate the target
/// record they are handed.
pub trait Plugin: Send + Sync {
    fn id(&self) -> &str;

    /// Full-sync hook with page context. `sources` and `targets` are aligned
    /// by index.
    fn convert_batch(&self, sources: &[Record], targets: &mut [Record]) -> Result<(), TransformError> {
        for (source, target) in sources.iter().zip(targets.iter_mut()) {
            self.convert_event(EventKind::Insert, source, target)?;
        }
        Ok(())
    }

    fn convert_event(
        &self,
        event: EventKind,
        source: &Record,
        target: &mut Record,
    ) -> Result<(), TransformError>;
}

type PluginFn = dyn Fn(EventKind, &Record, &mut Record) -> Result<(), String> + Send + Sync;

/// Adapts a closure into a [`Plugin`].
pub struct FnPlugin {
    id: String,
    f: Box<PluginFn>,
}

impl FnPlugin {
    pub fn new(
        id: impl Into<String>,
        f: impl Fn(EventKind, &Record, &mut Record) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            f: Box::new(f),
        }
    }
}

impl fmt::Debug for FnPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPlugin").field("id", &self.id).finish()
    }
}

impl Plugin for FnPlugin {
    fn id(&self) -> &str {
        &self.id
    }

    fn convert_event(
        &self,
        event: EventKind,
        source: &Record,
        target: &mut Record,
    ) -> Result<(), TransformError> {
        (self.f)(event, source, target).map_err(|reason| TransformError::Plugin {
            plugin: self.id.clone(),
            reason,
        })
    }
}

#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.insert(plugin.id().to_string(), plugin);
        self
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(id).cloned()
    }

    /// Looks up every id in order. Any unknown id fails the whole lookup.
    pub fn resolve(&self, ids: &[String]) -> Result<Vec<Arc<dyn Plugin>>, SyncError> {
        ids.iter()
            .map(|id| self.get(id).ok_or_else(|| SyncError::UnknownPlugin(id.clone())))
            .collect()
    }
}
