use serde::Serialize;
use thiserror::Error;

use crate::raster::RasterSourceSpec;
use crate::symbology::RasterPaint;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Raster,
}

/// A style layer as the map library expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterLayer {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub source: String,
    pub paint: RasterPaint,
}

impl RasterLayer {
    pub fn new(id: impl Into<String>, source: impl Into<String>, paint: RasterPaint) -> Self {
        Self {
            id: id.into(),
            kind: LayerKind::Raster,
            source: source.into(),
            paint,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("source `{0}` already exists")]
    DuplicateSource(String),
    #[error("layer `{0}` already exists")]
    DuplicateLayer(String),
    #[error("layer `{layer}` references missing source `{source_id}`")]
    MissingSource { layer: String, source_id: String },
    #[error("map rejected {op} for `{id}`: {message}")]
    Rejected {
        op: &'static str,
        id: String,
        message: String,
    },
}

/// The style-mutation surface of a map: named raster sources and layers.
pub trait MapSurface {
    /// Whether the style has finished its initial load.
    ///
    /// Latched: once true it stays true while tiles for a new source are
    /// still loading.
    fn is_style_ready(&self) -> bool;
    fn has_source(&self, id: &str) -> bool;
    fn has_layer(&self, id: &str) -> bool;
    fn add_raster_source(&mut self, id: &str, source: &RasterSourceSpec)
    -> Result<(), SurfaceError>;
    fn add_layer(&mut self, layer: &RasterLayer) -> Result<(), SurfaceError>;
    fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError>;
    fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError>;
}

#[cfg(test)]
mod tests {
    use super::RasterLayer;
    use crate::symbology::RasterPaint;

    #[test]
    fn serializes_in_style_shape() {
        let layer = RasterLayer::new("imagery", "imagery-src", RasterPaint::default());
        let json = serde_json::to_value(&layer).unwrap();
        assert_eq!(json["type"], "raster");
        assert_eq!(json["source"], "imagery-src");
        assert_eq!(json["paint"]["raster-fade-duration"], 0);
    }
}
