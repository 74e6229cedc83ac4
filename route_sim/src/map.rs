use std::collections::HashMap;

use route_sim_lib::geo_point::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayHandle(pub u64);

/// The map the session draws on.
///
/// Removing a marker or overlay that is not on the map must be a no-op.
pub trait MapView {
    fn place_marker(&mut self, point: GeoPoint, label: &str) -> MarkerHandle;
    fn move_marker(&mut self, marker: MarkerHandle, point: GeoPoint);
    fn remove_marker(&mut self, marker: MarkerHandle);
    fn show_route(&mut self, points: &[GeoPoint]) -> OverlayHandle;
    fn remove_overlay(&mut self, overlay: OverlayHandle);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub label: String,
    pub position: GeoPoint,
}

/// Headless map that keeps track of what would be drawn and logs it.
#[derive(Debug, Default)]
pub struct TracingMap {
    next_id: u64,
    markers: HashMap<MarkerHandle, Marker>,
    overlays: HashMap<OverlayHandle, Vec<GeoPoint>>,
}

impl TracingMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn marker(&self, marker: MarkerHandle) -> Option<&Marker> {
        self.markers.get(&marker)
    }

    pub fn find_marker(&self, label: &str) -> Option<&Marker> {
        self.markers.values().find(|marker| marker.label == label)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }
}

impl MapView for TracingMap {
    fn place_marker(&mut self, point: GeoPoint, label: &str) -> MarkerHandle {
        let handle = MarkerHandle(self.next_id());
        tracing::info!("Placed marker {} at {}", label, point);
        self.markers.insert(handle, Marker {
            label: label.to_string(),
            position: point,
        });
        handle
    }

    fn move_marker(&mut self, marker: MarkerHandle, point: GeoPoint) {
        if let Some(existing) = self.markers.get_mut(&marker) {
            tracing::trace!("Moved marker {} to {}", existing.label, point);
            existing.position = point;
        }
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        if let Some(removed) = self.markers.remove(&marker) {
            tracing::debug!("Removed marker {}", removed.label);
        }
    }

    fn show_route(&mut self, points: &[GeoPoint]) -> OverlayHandle {
        let handle = OverlayHandle(self.next_id());
        tracing::info!("Showing route with {} points", points.len());
        self.overlays.insert(handle, points.to_vec());
        handle
    }

    fn remove_overlay(&mut self, overlay: OverlayHandle) {
        if self.overlays.remove(&overlay).is_some() {
            tracing::debug!("Removed route overlay");
        }
    }
}
