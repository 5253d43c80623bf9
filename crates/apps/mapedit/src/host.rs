use foundation::Extent;
use layers::{RemoteLayerHandle, RemoteLayerSpec};
use services::{HostError, MapHost, MapView};
use tracing::info;

/// Map host without a screen: a fixed view plus a record of what was asked of it.
pub struct HeadlessHost {
    view: MapView,
    next_handle: u64,
    layers: Vec<RemoteLayerHandle>,
    last_extent: Option<Extent>,
}

impl HeadlessHost {
    pub fn new(view: MapView) -> Self {
        Self {
            view,
            next_handle: 0,
            layers: Vec::new(),
            last_extent: None,
        }
    }

    pub fn last_extent(&self) -> Option<Extent> {
        self.last_extent
    }
}

impl MapHost for HeadlessHost {
    fn view(&self) -> MapView {
        self.view
    }

    fn add_remote_layer(&mut self, spec: &RemoteLayerSpec) -> Result<RemoteLayerHandle, HostError> {
        self.next_handle += 1;
        let handle = RemoteLayerHandle(self.next_handle);
        info!(layers = %spec.layers, url = %spec.url, "remote layer attached");
        self.layers.push(handle);
        Ok(handle)
    }

    fn remove_remote_layer(&mut self, handle: RemoteLayerHandle) {
        self.layers.retain(|h| *h != handle);
    }

    fn set_extent(&mut self, extent: Extent, _animate: bool) {
        self.last_extent = Some(extent);
    }
}
