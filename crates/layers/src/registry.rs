use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::LayerError;
use crate::layer::{LayerBinding, LayerId, RemoteLayerHandle, RemoteLayerSpec};

/// Active remote layers by logical name.
///
/// At most one binding per name. Ids are never reused, so an id taken before
/// a remove/re-add no longer matches afterwards.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    next_id: u64,
    bindings: Vec<LayerBinding>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: &str,
        service: ServiceConfig,
        remote: RemoteLayerSpec,
        handle: RemoteLayerHandle,
    ) -> Result<LayerId, LayerError> {
        if self.get(name).is_some() {
            return Err(LayerError::AlreadyBound(name.to_string()));
        }
        let id = LayerId(self.next_id);
        self.next_id += 1;
        debug!(layer = name, id = id.0, "binding registered");
        self.bindings.push(LayerBinding {
            id,
            name: name.to_string(),
            service,
            remote,
            handle,
        });
        Ok(id)
    }

    pub fn remove(&mut self, name: &str) -> Option<LayerBinding> {
        let idx = self.bindings.iter().position(|b| b.name == name)?;
        Some(self.bindings.remove(idx))
    }

    pub fn get(&self, name: &str) -> Option<&LayerBinding> {
        self.bindings.iter().find(|b| b.name == name)
    }

    pub fn is_active(&self, id: LayerId) -> bool {
        self.bindings.iter().any(|b| b.id == id)
    }

    pub fn names(&self) -> Vec<&str> {
        self.bindings.iter().map(|b| b.name.as_str()).collect()
    }

    /// Bindings in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &LayerBinding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::LayerRegistry;
    use crate::config::ServiceConfig;
    use crate::error::LayerError;
    use crate::layer::{RemoteLayerHandle, RemoteLayerSpec};
    use std::collections::BTreeMap;

    fn bind(registry: &mut LayerRegistry, name: &str) -> Result<crate::LayerId, LayerError> {
        let service = ServiceConfig::new(name, "https://gis.example/wms", format!("ws:{name}"));
        let remote = RemoteLayerSpec::new(&service, None, &BTreeMap::new());
        registry.register(name, service, remote, RemoteLayerHandle(0))
    }

    #[test]
    fn one_binding_per_name() {
        let mut registry = LayerRegistry::new();
        bind(&mut registry, "commune").unwrap();
        assert_eq!(
            bind(&mut registry, "commune"),
            Err(LayerError::AlreadyBound("commune".into()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn readding_yields_a_fresh_id() {
        let mut registry = LayerRegistry::new();
        let first = bind(&mut registry, "province").unwrap();
        assert!(registry.is_active(first));
        registry.remove("province").unwrap();
        assert!(!registry.is_active(first));

        let second = bind(&mut registry, "province").unwrap();
        assert_ne!(first, second);
        assert!(!registry.is_active(first));
        assert_eq!(registry.names(), vec!["province"]);
    }
}
