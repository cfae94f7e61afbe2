use std::fmt;

/// Longitude/latitude pair in degrees, `[lng, lat]` ordering on the wire.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl fmt::Display for LngLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lng, self.lat)
    }
}

/// Axis-aligned geographic bounds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoBounds {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

/// Four-corner geographic quad for image/video sources.
///
/// Ordering contract:
/// - Corners are stored top-left, top-right, bottom-right, bottom-left
///   (top-left then clockwise), matching what the render surface expects.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoQuad {
    pub corners: [LngLat; 4],
}

impl GeoQuad {
    /// Builds a quad from corners already in top-left-then-clockwise order.
    pub fn new(corners: [LngLat; 4]) -> Self {
        Self { corners }
    }

    /// Builds a quad from corners in arbitrary order.
    ///
    /// Backends disagree about corner ordering, so this classifies corners by
    /// latitude/longitude rank instead of trusting the source ordering.
    pub fn normalized(mut corners: [LngLat; 4]) -> Self {
        // Top two by latitude, then left/right by longitude within each pair.
        corners.sort_by(|a, b| b.lat.total_cmp(&a.lat));
        let (top, bottom) = corners.split_at(2);
        let mut top = [top[0], top[1]];
        let mut bottom = [bottom[0], bottom[1]];
        top.sort_by(|a, b| a.lng.total_cmp(&b.lng));
        bottom.sort_by(|a, b| b.lng.total_cmp(&a.lng));
        Self {
            corners: [top[0], top[1], bottom[0], bottom[1]],
        }
    }

    pub fn bounds(&self) -> GeoBounds {
        let mut min_lng = f64::INFINITY;
        let mut min_lat = f64::INFINITY;
        let mut max_lng = f64::NEG_INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        for c in &self.corners {
            min_lng = min_lng.min(c.lng);
            min_lat = min_lat.min(c.lat);
            max_lng = max_lng.max(c.lng);
            max_lat = max_lat.max(c.lat);
        }
        GeoBounds {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    /// Bounding box of the quad, scaled about its center by `multiplier`.
    ///
    /// Used when locking the camera to a moving video footprint: a multiplier
    /// above 1 keeps some margin around the frame.
    pub fn expanded_bounds(&self, multiplier: f64) -> GeoBounds {
        let b = self.bounds();
        let center_lng = (b.min_lng + b.max_lng) / 2.0;
        let center_lat = (b.min_lat + b.max_lat) / 2.0;
        let half_width = (b.max_lng - b.min_lng) / 2.0 * multiplier;
        let half_height = (b.max_lat - b.min_lat) / 2.0 * multiplier;
        GeoBounds {
            min_lng: center_lng - half_width,
            min_lat: center_lat - half_height,
            max_lng: center_lng + half_width,
            max_lat: center_lat + half_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GeoQuad, LngLat};

    fn quad() -> [LngLat; 4] {
        [
            LngLat::new(-1.0, -1.0), // bottom-left
            LngLat::new(1.0, -1.0),  // bottom-right
            LngLat::new(1.0, 1.0),   // top-right
            LngLat::new(-1.0, 1.0),  // top-left
        ]
    }

    #[test]
    fn normalized_is_top_left_then_clockwise() {
        let q = GeoQuad::normalized(quad());
        assert_eq!(q.corners[0], LngLat::new(-1.0, 1.0));
        assert_eq!(q.corners[1], LngLat::new(1.0, 1.0));
        assert_eq!(q.corners[2], LngLat::new(1.0, -1.0));
        assert_eq!(q.corners[3], LngLat::new(-1.0, -1.0));
    }

    #[test]
    fn normalization_ignores_source_ordering() {
        let mut shuffled = quad();
        shuffled.swap(0, 2);
        shuffled.swap(1, 3);
        assert_eq!(GeoQuad::normalized(shuffled), GeoQuad::normalized(quad()));
    }

    #[test]
    fn expanded_bounds_scales_about_center() {
        let q = GeoQuad::normalized(quad());
        let b = q.expanded_bounds(2.0);
        assert_eq!(b.min_lng, -2.0);
        assert_eq!(b.max_lat, 2.0);
        let unit = q.expanded_bounds(1.0);
        assert_eq!(unit.min_lng, -1.0);
        assert_eq!(unit.max_lng, 1.0);
    }
}
