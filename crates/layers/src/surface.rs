use std::collections::BTreeMap;

use crate::layer::{MapSurface, RasterLayer, SurfaceError};
use crate::raster::RasterSourceSpec;

/// Headless [`MapSurface`] with the same duplicate/missing-id rules as a real
/// map style.
#[derive(Debug, Default, Clone)]
pub struct MemorySurface {
    style_ready: bool,
    tiles_loading: bool,
    sources: BTreeMap<String, RasterSourceSpec>,
    layers: Vec<RasterLayer>,
    installs: usize,
}

impl MemorySurface {
    pub fn ready() -> Self {
        Self {
            style_ready: true,
            ..Self::default()
        }
    }

    /// A surface whose style has not finished loading.
    pub fn loading() -> Self {
        Self::default()
    }

    pub fn set_style_ready(&mut self, ready: bool) {
        self.style_ready = ready;
    }

    /// Tiles of the last installed source have been requested but not
    /// reported rendered.
    pub fn tiles_loading(&self) -> bool {
        self.tiles_loading
    }

    pub fn settle_tiles(&mut self) {
        self.tiles_loading = false;
    }

    pub fn source(&self, id: &str) -> Option<&RasterSourceSpec> {
        self.sources.get(id)
    }

    pub fn layers(&self) -> &[RasterLayer] {
        &self.layers
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Number of sources ever added.
    pub fn installs(&self) -> usize {
        self.installs
    }
}

impl MapSurface for MemorySurface {
    fn is_style_ready(&self) -> bool {
        self.style_ready
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id == id)
    }

    fn add_raster_source(
        &mut self,
        id: &str,
        source: &RasterSourceSpec,
    ) -> Result<(), SurfaceError> {
        if self.sources.contains_key(id) {
            return Err(SurfaceError::DuplicateSource(id.to_string()));
        }
        self.sources.insert(id.to_string(), source.clone());
        self.installs += 1;
        self.tiles_loading = true;
        Ok(())
    }

    fn add_layer(&mut self, layer: &RasterLayer) -> Result<(), SurfaceError> {
        if self.has_layer(&layer.id) {
            return Err(SurfaceError::DuplicateLayer(layer.id.clone()));
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(SurfaceError::MissingSource {
                layer: layer.id.clone(),
                source_id: layer.source.clone(),
            });
        }
        self.layers.push(layer.clone());
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError> {
        self.layers.retain(|l| l.id != id);
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError> {
        if self.layers.iter().any(|l| l.source == id) {
            return Err(SurfaceError::Rejected {
                op: "remove_source",
                id: id.to_string(),
                message: "source is still used by a layer".to_string(),
            });
        }
        self.sources.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemorySurface;
    use crate::layer::{MapSurface, RasterLayer, SurfaceError};
    use crate::raster::TileSourceDescriptor;
    use crate::symbology::RasterPaint;
    use foundation::CalendarDate;

    #[test]
    fn rejects_duplicate_source() {
        let mut s = MemorySurface::ready();
        let spec = TileSourceDescriptor::default()
            .source_for(CalendarDate::from_ymd(2024, 1, 1).unwrap());
        s.add_raster_source("a", &spec).unwrap();
        assert_eq!(
            s.add_raster_source("a", &spec),
            Err(SurfaceError::DuplicateSource("a".to_string()))
        );
    }

    #[test]
    fn refuses_to_remove_source_in_use() {
        let mut s = MemorySurface::ready();
        let spec = TileSourceDescriptor::default()
            .source_for(CalendarDate::from_ymd(2024, 1, 1).unwrap());
        s.add_raster_source("a", &spec).unwrap();
        s.add_layer(&RasterLayer::new("l", "a", RasterPaint::default()))
            .unwrap();
        assert!(s.remove_source("a").is_err());
        s.remove_layer("l").unwrap();
        assert!(s.remove_source("a").is_ok());
        assert_eq!(s.source_count(), 0);
    }

    #[test]
    fn pending_tiles_do_not_unload_the_style() {
        let mut s = MemorySurface::ready();
        let spec = TileSourceDescriptor::default()
            .source_for(CalendarDate::from_ymd(2024, 1, 1).unwrap());
        s.add_raster_source("a", &spec).unwrap();
        assert!(s.tiles_loading());
        assert!(s.is_style_ready());
        s.settle_tiles();
        assert!(!s.tiles_loading());
    }
}
