use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

use crate::{
    error::ViewLoadError,
    pattern::Params,
    route::{ResolvedRoute, RouteTable},
};

/// ViewModule
///
/// A loaded view: what a lazy import resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewModule {
    pub view: String,
    /// Where the module was loaded from, e.g. `views/admin/users`.
    pub source: String,
}

/// ViewFactory
///
/// Loads one view on demand. The registry calls it at most once per view.
#[async_trait]
pub trait ViewFactory: Send + Sync {
    async fn load(&self, view: &str) -> Result<ViewModule, ViewLoadError>;
}

/// ModuleViewFactory
///
/// Resolves a view to the module under a fixed prefix (`views/` by default).
#[derive(Debug, Clone)]
pub struct ModuleViewFactory {
    prefix: String,
}

impl ModuleViewFactory {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for ModuleViewFactory {
    fn default() -> Self {
        Self::new("views")
    }
}

#[async_trait]
impl ViewFactory for ModuleViewFactory {
    async fn load(&self, view: &str) -> Result<ViewModule, ViewLoadError> {
        Ok(ViewModule {
            view: view.to_string(),
            source: format!("{}/{}", self.prefix, view),
        })
    }
}

/// ViewRegistry
///
/// Maps view identifiers to factories and memoises what they produce. Concurrent
/// loads of the same view share a single factory call.
#[derive(Default)]
pub struct ViewRegistry {
    factories: HashMap<String, Arc<dyn ViewFactory>>,
    loaded: Mutex<HashMap<String, Arc<OnceCell<ViewModule>>>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// for_table
    ///
    /// Registers `factory` for every view the table mentions, parents included.
    pub fn for_table(table: &RouteTable, factory: Arc<dyn ViewFactory>) -> Self {
        let mut registry = Self::new();
        let mut pending: Vec<&crate::route::Route> = table.routes().iter().collect();
        while let Some(route) = pending.pop() {
            registry.register(&route.view, Arc::clone(&factory));
            pending.extend(route.children.iter());
        }
        registry
    }

    pub fn register(&mut self, view: &str, factory: Arc<dyn ViewFactory>) {
        self.factories.insert(view.to_string(), factory);
    }

    pub fn is_registered(&self, view: &str) -> bool {
        self.factories.contains_key(view)
    }

    pub fn is_loaded(&self, view: &str) -> bool {
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(view)
            .is_some_and(|cell| cell.initialized())
    }

    /// load
    ///
    /// Resolves a view, calling its factory the first time only. A failed load
    /// is not memoised.
    pub async fn load(&self, view: &str) -> Result<ViewModule, ViewLoadError> {
        let factory = self
            .factories
            .get(view)
            .ok_or_else(|| ViewLoadError::Unregistered(view.to_string()))?;

        let cell = {
            let mut loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(loaded.entry(view.to_string()).or_default())
        };

        let module = cell
            .get_or_try_init(|| async {
                tracing::debug!(view, "loading view");
                factory.load(view).await
            })
            .await?;
        Ok(module.clone())
    }
}

/// Props
///
/// Route params handed to a view whose route enables props. Values stay strings
/// until the view asks for a concrete type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Props(Params);

impl Props {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// parse
    ///
    /// Parses one prop into `T`. `Ok(None)` when the prop is absent.
    pub fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>, T::Err> {
        self.0.get(key).map(|value| value.parse()).transpose()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// MountedLayer
///
/// One loaded view of the chain with the props its own record declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountedLayer {
    pub module: ViewModule,
    pub props: Option<Props>,
}

/// MountedView
///
/// The loaded view chain for a settled navigation, outermost layout first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountedView {
    pub layers: Vec<MountedLayer>,
}

impl MountedView {
    /// mount
    ///
    /// Loads every view on the matched chain in order. Each layer gets the route
    /// params only when its own record enables props.
    pub async fn mount(registry: &ViewRegistry, route: &ResolvedRoute) -> Result<Self, ViewLoadError> {
        let mut layers = Vec::with_capacity(route.matched_views.len());
        for matched in &route.matched_views {
            layers.push(MountedLayer {
                module: registry.load(&matched.view).await?,
                props: matched.props.then(|| Props(route.params.clone())),
            });
        }
        Ok(Self { layers })
    }

    pub fn modules(&self) -> impl Iterator<Item = &ViewModule> {
        self.layers.iter().map(|layer| &layer.module)
    }

    /// The layer that mounted `view`, if it is on the chain.
    pub fn layer(&self, view: &str) -> Option<&MountedLayer> {
        self.layers.iter().find(|layer| layer.module.view == view)
    }

    /// The innermost view, the one the route names.
    pub fn leaf(&self) -> Option<&ViewModule> {
        self.layers.last().map(|layer| &layer.module)
    }

    /// Props of the innermost view.
    pub fn props(&self) -> Option<&Props> {
        self.layers.last().and_then(|layer| layer.props.as_ref())
    }
}
