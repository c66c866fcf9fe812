use foundation::CalendarDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layer::{MapSurface, RasterLayer, SurfaceError};
use crate::symbology::RasterPaint;

/// NASA GIBS daily MODIS Terra true-color mosaic, web-mercator tiling.
pub const GIBS_TRUE_COLOR_TEMPLATE: &str = "https://gibs.earthdata.nasa.gov/wmts/epsg3857/best/MODIS_Terra_CorrectedReflectance_TrueColor/default/{date}/GoogleMapsCompatible_Level9/{z}/{y}/{x}.jpg";
pub const GIBS_ATTRIBUTION: &str = "Imagery: NASA EOSDIS GIBS";
pub const GIBS_MAX_ZOOM: u8 = 9;

pub const IMAGERY_SOURCE_ID: &str = "imagery";
pub const IMAGERY_LAYER_ID: &str = "imagery-layer";

/// Tile URL pattern with a `{date}` slot.
///
/// `{z}`, `{x}` and `{y}` are left for the map library to fill per tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileTemplate(String);

impl TileTemplate {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    pub fn pattern(&self) -> &str {
        &self.0
    }

    pub fn for_date(&self, date: CalendarDate) -> String {
        self.0.replace("{date}", &date.to_string())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Raster,
}

/// A raster source as the map style expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterSourceSpec {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub tiles: Vec<String>,
    #[serde(rename = "tileSize")]
    pub tile_size: u32,
    pub attribution: String,
    pub maxzoom: u8,
}

/// Everything needed to build the imagery source for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSourceDescriptor {
    pub template: TileTemplate,
    pub tile_size: u32,
    pub attribution: String,
    pub max_zoom: u8,
}

impl TileSourceDescriptor {
    pub fn gibs_true_color() -> Self {
        Self {
            template: TileTemplate::new(GIBS_TRUE_COLOR_TEMPLATE),
            tile_size: 256,
            attribution: GIBS_ATTRIBUTION.to_string(),
            max_zoom: GIBS_MAX_ZOOM,
        }
    }

    pub fn source_for(&self, date: CalendarDate) -> RasterSourceSpec {
        RasterSourceSpec {
            kind: SourceKind::Raster,
            tiles: vec![self.template.for_date(date)],
            tile_size: self.tile_size,
            attribution: self.attribution.clone(),
            maxzoom: self.max_zoom,
        }
    }
}

impl Default for TileSourceDescriptor {
    fn default() -> Self {
        Self::gibs_true_color()
    }
}

/// Keeps exactly one imagery source/layer pair installed on a surface.
///
/// Switching dates removes the previous pair and installs a fresh one; the
/// installed source is never mutated in place.
#[derive(Debug, Clone)]
pub struct RasterBinding {
    source_id: String,
    layer_id: String,
    descriptor: TileSourceDescriptor,
    paint: RasterPaint,
    active: Option<CalendarDate>,
}

impl RasterBinding {
    pub fn new(descriptor: TileSourceDescriptor) -> Self {
        Self {
            source_id: IMAGERY_SOURCE_ID.to_string(),
            layer_id: IMAGERY_LAYER_ID.to_string(),
            descriptor,
            paint: RasterPaint::default(),
            active: None,
        }
    }

    /// Date of the pair currently installed, if any.
    pub fn active_date(&self) -> Option<CalendarDate> {
        self.active
    }

    /// Replace the installed imagery with tiles for `date`.
    ///
    /// Returns `Ok(false)` without touching the surface when its style is not
    /// loaded yet. Does not wait for tiles.
    pub fn set_date<S>(&mut self, surface: &mut S, date: CalendarDate) -> Result<bool, SurfaceError>
    where
        S: MapSurface + ?Sized,
    {
        if !surface.is_style_ready() {
            debug!(%date, "style not ready, skipping imagery swap");
            return Ok(false);
        }

        if surface.has_layer(&self.layer_id) {
            surface.remove_layer(&self.layer_id)?;
        }
        if surface.has_source(&self.source_id) {
            surface.remove_source(&self.source_id)?;
        }
        // Nothing is installed until both adds succeed.
        self.active = None;

        surface.add_raster_source(&self.source_id, &self.descriptor.source_for(date))?;
        surface.add_layer(&RasterLayer::new(
            self.layer_id.clone(),
            self.source_id.clone(),
            self.paint,
        ))?;
        self.active = Some(date);
        debug!(%date, "imagery source installed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> CalendarDate {
        CalendarDate::from_ymd(2024, 5, d).unwrap()
    }

    #[test]
    fn template_substitutes_date_and_keeps_tile_slots() {
        let t = TileTemplate::new(GIBS_TRUE_COLOR_TEMPLATE);
        let url = t.for_date(day(9));
        assert!(url.contains("/default/2024-05-09/"));
        assert!(url.ends_with("/{z}/{y}/{x}.jpg"));
    }

    #[test]
    fn source_spec_serializes_in_style_shape() {
        let spec = TileSourceDescriptor::gibs_true_color().source_for(day(1));
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["type"], "raster");
        assert_eq!(json["tileSize"], 256);
        assert_eq!(json["maxzoom"], 9);
        assert_eq!(json["tiles"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn first_call_installs_one_pair() {
        let mut surface = MemorySurface::ready();
        let mut binding = RasterBinding::new(TileSourceDescriptor::default());

        assert_eq!(binding.set_date(&mut surface, day(1)), Ok(true));
        assert_eq!(surface.source_count(), 1);
        assert_eq!(surface.layer_count(), 1);
        assert_eq!(binding.active_date(), Some(day(1)));
    }

    #[test]
    fn repeated_calls_leave_exactly_one_pair() {
        let mut surface = MemorySurface::ready();
        let mut binding = RasterBinding::new(TileSourceDescriptor::default());

        binding.set_date(&mut surface, day(1)).unwrap();
        binding.set_date(&mut surface, day(2)).unwrap();
        binding.set_date(&mut surface, day(2)).unwrap();

        assert_eq!(surface.source_count(), 1);
        assert_eq!(surface.layer_count(), 1);
        let tiles = &surface.source(IMAGERY_SOURCE_ID).unwrap().tiles;
        assert!(tiles[0].contains("2024-05-02"));
        assert_eq!(surface.installs(), 3);
    }

    #[test]
    fn unloaded_style_is_a_no_op() {
        let mut surface = MemorySurface::loading();
        let mut binding = RasterBinding::new(TileSourceDescriptor::default());

        assert_eq!(binding.set_date(&mut surface, day(1)), Ok(false));
        assert_eq!(surface.source_count(), 0);
        assert_eq!(binding.active_date(), None);
    }
}
