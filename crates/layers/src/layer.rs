use std::collections::BTreeMap;

use crate::config::ServiceConfig;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u64);

/// Host-side handle of a remote layer added to the map.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RemoteLayerHandle(pub u64);

/// Everything the host needs to build a remote WMS layer.
///
/// Request parameters are fixed once built; a new filter means a new layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLayerSpec {
    pub url: String,
    pub layers: String,
    pub params: BTreeMap<String, String>,
}

impl RemoteLayerSpec {
    pub const FILTER_PARAM: &'static str = "CQL_FILTER";

    pub fn new(
        service: &ServiceConfig,
        filter: Option<&str>,
        extra: &BTreeMap<String, String>,
    ) -> Self {
        let mut params = extra.clone();
        if let Some(filter) = filter.filter(|f| !f.trim().is_empty()) {
            params.insert(Self::FILTER_PARAM.to_string(), filter.to_string());
        }
        Self {
            url: service.url.clone(),
            layers: service.layers.clone(),
            params,
        }
    }

    pub fn filter(&self) -> Option<&str> {
        self.params.get(Self::FILTER_PARAM).map(String::as_str)
    }
}

/// An active remote layer under its logical name.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerBinding {
    pub id: LayerId,
    pub name: String,
    pub service: ServiceConfig,
    pub remote: RemoteLayerSpec,
    pub handle: RemoteLayerHandle,
}

impl LayerBinding {
    pub fn filter(&self) -> Option<&str> {
        self.remote.filter()
    }
}
