use serde::Serialize;

/// Paint properties of the imagery layer.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct RasterPaint {
    #[serde(rename = "raster-opacity")]
    pub opacity: f32,
    /// Cross-fade between tile sets. Zero keeps consecutive frames crisp.
    #[serde(rename = "raster-fade-duration")]
    pub fade_duration_ms: u32,
}

impl Default for RasterPaint {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            fade_duration_ms: 0,
        }
    }
}
