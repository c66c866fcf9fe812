use std::time::Duration;

use capture::{DEFAULT_FILENAME_PREFIX, TransportSettings};
use foundation::{DEFAULT_EMBARGO_DAYS, INDIA_CENTER, LngLat};
use layers::{GIBS_ATTRIBUTION, GIBS_MAX_ZOOM, GIBS_TRUE_COLOR_TEMPLATE, TileSourceDescriptor, TileTemplate};
use runtime::{DAY_BOUNDS, FPS_BOUNDS};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_GLYPHS: &str = "https://demotiles.maplibre.org/font/{fontstack}/{range}.pbf";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid viewer config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("tile template is missing `{0}`")]
    TemplatePlaceholder(&'static str),

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },

    #[error("config override unreadable: {0}")]
    Js(String),
}

/// Viewer settings. Every field has a default; a page may override any of
/// them through `window.__timelapseConfig`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    pub container_id: String,
    pub controls_id: String,
    pub center: LngLat,
    pub zoom: f64,
    pub tile_template: TileTemplate,
    pub tile_size: u32,
    pub max_zoom: u8,
    pub attribution: String,
    pub glyphs: String,
    pub embargo_days: u32,
    pub idle_timeout_ms: u64,
    pub days: u32,
    pub fps: u32,
    pub recorder_timeslice_ms: u32,
    pub filename_prefix: String,
    pub log_level: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            container_id: "timelapse-map".to_string(),
            controls_id: "timelapse-controls".to_string(),
            center: INDIA_CENTER,
            zoom: 4.0,
            tile_template: TileTemplate::new(GIBS_TRUE_COLOR_TEMPLATE),
            tile_size: 256,
            max_zoom: GIBS_MAX_ZOOM,
            attribution: GIBS_ATTRIBUTION.to_string(),
            glyphs: DEFAULT_GLYPHS.to_string(),
            embargo_days: DEFAULT_EMBARGO_DAYS,
            idle_timeout_ms: 1500,
            days: 30,
            fps: 10,
            recorder_timeslice_ms: 1000,
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ViewerConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validated()
    }

    /// Reject values the map or the controls cannot work with.
    ///
    /// Day count and frame rate are clamped into their input bounds rather
    /// than rejected.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        for slot in ["{date}", "{z}", "{x}", "{y}"] {
            if !self.tile_template.pattern().contains(slot) {
                return Err(ConfigError::TemplatePlaceholder(slot));
            }
        }
        if !(0.0..=22.0).contains(&self.zoom) {
            return Err(ConfigError::OutOfRange {
                field: "zoom",
                value: self.zoom.to_string(),
            });
        }
        if self.tile_size == 0 {
            return Err(ConfigError::OutOfRange {
                field: "tileSize",
                value: "0".to_string(),
            });
        }
        self.center = self.center.clamped();
        self.days = DAY_BOUNDS.clamp(self.days);
        self.fps = FPS_BOUNDS.clamp(self.fps);
        Ok(self)
    }

    pub fn tile_source(&self) -> TileSourceDescriptor {
        TileSourceDescriptor {
            template: self.tile_template.clone(),
            tile_size: self.tile_size,
            attribution: self.attribution.clone(),
            max_zoom: self.max_zoom,
        }
    }

    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            days: self.days,
            fps: self.fps,
            embargo_days: self.embargo_days,
            idle_timeout: Duration::from_millis(self.idle_timeout_ms),
        }
    }

    pub fn max_log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

#[cfg(target_arch = "wasm32")]
mod window_override {
    use super::{ConfigError, ViewerConfig};
    use wasm_bindgen::JsValue;

    const OVERRIDE_KEY: &str = "__timelapseConfig";

    impl ViewerConfig {
        /// Defaults merged with the page's `window.__timelapseConfig`, if set.
        pub fn from_window() -> Result<Self, ConfigError> {
            let Some(window) = web_sys::window() else {
                return Ok(Self::default());
            };
            let value = js_sys::Reflect::get(&window, &JsValue::from_str(OVERRIDE_KEY))
                .map_err(|e| ConfigError::Js(format!("{e:?}")))?;
            if value.is_undefined() || value.is_null() {
                return Ok(Self::default());
            }
            let raw = js_sys::JSON::stringify(&value)
                .map_err(|e| ConfigError::Js(format!("{e:?}")))?
                .as_string()
                .unwrap_or_default();
            Self::from_json(&raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ViewerConfig};
    use foundation::LngLat;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn empty_object_gives_defaults() {
        let config = ViewerConfig::from_json("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.transport_settings().idle_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn overrides_are_camel_case() {
        let config = ViewerConfig::from_json(
            r#"{"idleTimeoutMs": 4000, "center": [77.2, 28.6], "zoom": 6, "filenamePrefix": "delhi"}"#,
        )
        .unwrap();
        assert_eq!(config.idle_timeout_ms, 4000);
        assert_eq!(config.center, LngLat::new(77.2, 28.6));
        assert_eq!(config.zoom, 6.0);
        assert_eq!(config.filename_prefix, "delhi");
        assert_eq!(config.days, 30);
    }

    #[test]
    fn day_count_and_fps_are_clamped() {
        let config = ViewerConfig::from_json(r#"{"days": 1000, "fps": 1}"#).unwrap();
        assert_eq!(config.days, 120);
        assert_eq!(config.fps, 5);
    }

    #[test]
    fn template_must_keep_all_slots() {
        let err = ViewerConfig::from_json(r#"{"tileTemplate": "https://t/{z}/{x}/{y}.png"}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::TemplatePlaceholder("{date}")));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            ViewerConfig::from_json("{days:"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let config = ViewerConfig {
            log_level: "chatty".to_string(),
            ..ViewerConfig::default()
        };
        assert_eq!(config.max_log_level(), tracing::Level::INFO);
    }
}
