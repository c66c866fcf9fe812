use serde::{Deserialize, Serialize};

/// Longitude/latitude in degrees, serialized as `[lng, lat]` like map styles expect.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Clamp into the valid WGS84 range.
    pub fn clamped(self) -> Self {
        Self {
            lng: self.lng.clamp(-180.0, 180.0),
            lat: self.lat.clamp(-90.0, 90.0),
        }
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        [p.lng, p.lat]
    }
}

/// Rough geographic center of the Indian subcontinent.
pub const INDIA_CENTER: LngLat = LngLat::new(78.9629, 22.5937);

#[cfg(test)]
mod tests {
    use super::LngLat;

    #[test]
    fn clamped_limits_range() {
        let p = LngLat::new(200.0, -95.0).clamped();
        assert_eq!(p, LngLat::new(180.0, -90.0));
    }

    #[test]
    fn array_conversion_is_lng_first() {
        let arr: [f64; 2] = LngLat::new(78.0, 22.0).into();
        assert_eq!(arr, [78.0, 22.0]);
    }
}
