//! Active remote layers on one map, their filters and the extents they zoom to.

use std::collections::BTreeMap;
use std::sync::Arc;

use foundation::{Extent, MapPoint, ScreenPoint};
use futures_util::future::join_all;
use layers::{
    DeploymentConfig, LayerError, LayerId, LayerRegistry, RemoteLayerHandle, RemoteLayerSpec,
    ServiceConfig,
};
use tracing::{debug, info, warn};

use crate::extent::{ExtentResolver, ResolvedExtent};
use crate::query::{FeatureQueryEngine, FeatureSink, MapView, QueryOutcome, display_point};
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    pub message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "map host: {}", self.message)
    }
}

impl std::error::Error for HostError {}

/// The map widget the session drives.
pub trait MapHost {
    fn view(&self) -> MapView;
    fn add_remote_layer(&mut self, spec: &RemoteLayerSpec) -> Result<RemoteLayerHandle, HostError>;
    fn remove_remote_layer(&mut self, handle: RemoteLayerHandle);
    fn set_extent(&mut self, extent: Extent, animate: bool);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    Layer(LayerError),
    Host(HostError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Layer(e) => write!(f, "{e}"),
            SessionError::Host(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Layer(e) => Some(e),
            SessionError::Host(e) => Some(e),
        }
    }
}

impl From<LayerError> for SessionError {
    fn from(e: LayerError) -> Self {
        SessionError::Layer(e)
    }
}

impl From<HostError> for SessionError {
    fn from(e: HostError) -> Self {
        SessionError::Host(e)
    }
}

/// Extent resolution for a freshly added binding.
///
/// Owns everything it needs so the session stays usable while it runs.
pub struct ExtentJob {
    binding: LayerId,
    service: ServiceConfig,
    filter: Option<String>,
    resolver: ExtentResolver,
}

impl ExtentJob {
    pub fn binding(&self) -> LayerId {
        self.binding
    }

    pub async fn run(self) -> ExtentUpdate {
        let resolved = self
            .resolver
            .resolve(&self.service, self.filter.as_deref())
            .await;
        ExtentUpdate {
            binding: self.binding,
            layer: self.service.name,
            resolved,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtentUpdate {
    pub binding: LayerId,
    pub layer: String,
    pub resolved: Option<ResolvedExtent>,
}

pub struct MapSession<H> {
    config: Arc<DeploymentConfig>,
    host: H,
    registry: LayerRegistry,
    engine: FeatureQueryEngine,
    resolver: ExtentResolver,
}

impl<H: MapHost> MapSession<H> {
    pub fn new(config: Arc<DeploymentConfig>, host: H, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            host,
            registry: LayerRegistry::new(),
            engine: FeatureQueryEngine::new(transport.clone()),
            resolver: ExtentResolver::new(transport),
        }
    }

    pub fn config(&self) -> &DeploymentConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    /// Shows the configured layer `name`, optionally filtered.
    ///
    /// Nothing changes when the name is unknown or already shown.
    pub fn add_layer(
        &mut self,
        name: &str,
        filter: Option<&str>,
        params: &BTreeMap<String, String>,
    ) -> Result<ExtentJob, SessionError> {
        let service = self
            .config
            .service(name)
            .cloned()
            .ok_or_else(|| LayerError::ConfigurationMissing(name.to_string()))?;
        if self.registry.get(name).is_some() {
            return Err(LayerError::AlreadyBound(name.to_string()).into());
        }

        let remote = RemoteLayerSpec::new(&service, filter, params);
        let handle = self.host.add_remote_layer(&remote)?;
        let filter = remote.filter().map(str::to_string);
        let binding = match self
            .registry
            .register(name, service.clone(), remote, handle)
        {
            Ok(id) => id,
            Err(err) => {
                self.host.remove_remote_layer(handle);
                return Err(err.into());
            }
        };
        info!(layer = name, filter = filter.as_deref().unwrap_or(""), "layer added");

        Ok(ExtentJob {
            binding,
            service,
            filter,
            resolver: self.resolver.clone(),
        })
    }

    /// Adds the layer and zooms to it once its extent is known.
    pub async fn show_layer(
        &mut self,
        name: &str,
        filter: Option<&str>,
        params: &BTreeMap<String, String>,
    ) -> Result<bool, SessionError> {
        let job = self.add_layer(name, filter, params)?;
        let update = job.run().await;
        Ok(self.apply_extent(update))
    }

    /// `false` when the layer was not shown.
    pub fn remove_layer(&mut self, name: &str) -> bool {
        match self.registry.remove(name) {
            Some(binding) => {
                self.host.remove_remote_layer(binding.handle);
                debug!(layer = name, "layer removed");
                true
            }
            None => false,
        }
    }

    /// Replaces the filter on `name`.
    ///
    /// Layers that `name` excludes are removed as well and stay removed.
    /// Extra request parameters of the previous binding are kept.
    pub fn update_filter(
        &mut self,
        name: &str,
        filter: Option<&str>,
    ) -> Result<ExtentJob, SessionError> {
        if self.config.service(name).is_none() {
            return Err(LayerError::ConfigurationMissing(name.to_string()).into());
        }

        let mut params = self
            .registry
            .get(name)
            .map(|b| b.remote.params.clone())
            .unwrap_or_default();
        params.remove(RemoteLayerSpec::FILTER_PARAM);

        let config = Arc::clone(&self.config);
        self.remove_layer(name);
        for excluded in config.excluded_by(name) {
            if self.remove_layer(excluded) {
                debug!(layer = name, excluded = %excluded, "excluded layer removed");
            }
        }
        self.add_layer(name, filter, &params)
    }

    /// Zooms to a resolved extent if its binding is still the live one.
    pub fn apply_extent(&mut self, update: ExtentUpdate) -> bool {
        if !self.registry.is_active(update.binding) {
            debug!(layer = %update.layer, "discarding extent for a replaced binding");
            return false;
        }
        match update.resolved {
            Some(resolved) => {
                self.host.set_extent(resolved.extent, true);
                true
            }
            None => {
                warn!(layer = %update.layer, "no extent available");
                false
            }
        }
    }

    /// Queries every shown layer at a click and hands records to `sink`.
    ///
    /// Requests run concurrently; outcomes come back in binding order. The
    /// sink receives the click in WGS84 when the view CRS can be converted.
    pub async fn query_click(
        &self,
        pixel: ScreenPoint,
        at: MapPoint,
        sink: &mut dyn FeatureSink,
    ) -> Vec<(String, QueryOutcome)> {
        let view = self.host.view();
        let pending = self.registry.iter().map(|binding| {
            let engine = &self.engine;
            async move {
                let outcome = engine
                    .query(
                        &binding.service.url,
                        &binding.remote.layers,
                        &view,
                        pixel,
                        binding.filter(),
                        &binding.remote.params,
                    )
                    .await;
                (binding.name.clone(), outcome)
            }
        });
        let outcomes = join_all(pending).await;

        let shown_at = display_point(at, view.extent.crs());
        for (layer, outcome) in &outcomes {
            match outcome {
                QueryOutcome::Data(records) => sink.show(layer, records, shown_at),
                QueryOutcome::Empty => debug!(layer = %layer, "no features at click"),
                QueryOutcome::Failure(err) => warn!(layer = %layer, error = %err, "feature query failed"),
            }
        }
        outcomes
    }
}
