use std::collections::BTreeMap;

use foundation::geo::{GeoQuad, LngLat};
use serde::{Deserialize, Serialize};

/// Full-motion-video layer metadata: playback parameters plus the per-frame
/// geographic footprint of the video quad.
///
/// Frame bounds are sparse. Frames without an entry reuse the bounds of the
/// nearest frame with a GREATER id; frames past the last keyed frame have no
/// bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    #[serde(rename = "fmvFps", default = "default_fps")]
    pub fps: f64,
    #[serde(rename = "fmvFrameWidth", default)]
    pub frame_width: u32,
    #[serde(rename = "fmvFrameHeight", default)]
    pub frame_height: u32,
    #[serde(rename = "fmvFrameCount", default)]
    pub frame_count: u64,
    #[serde(rename = "fmvVideoUrl", default)]
    pub video_url: String,
    #[serde(rename = "frameIdToBBox", default)]
    pub frame_bounds: BTreeMap<u64, [[f64; 2]; 4]>,
}

fn default_fps() -> f64 {
    30.0
}

impl VideoMetadata {
    /// Quad for `frame`, falling back to the nearest greater keyed frame.
    /// Never falls back to a lesser frame; past the last key there is no quad.
    pub fn bounds_at_frame(&self, frame: u64) -> Option<GeoQuad> {
        let corners = self
            .frame_bounds
            .get(&frame)
            .or_else(|| self.frame_bounds.range(frame..).next().map(|(_, v)| v))?;
        Some(GeoQuad::new([
            LngLat::new(corners[0][0], corners[0][1]),
            LngLat::new(corners[1][0], corners[1][1]),
            LngLat::new(corners[2][0], corners[2][1]),
            LngLat::new(corners[3][0], corners[3][1]),
        ]))
    }

    pub fn contains_frame(&self, frame: u64) -> bool {
        frame < self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::VideoMetadata;

    fn metadata() -> VideoMetadata {
        serde_json::from_value(json!({
            "fmvFps": 24.0,
            "fmvFrameWidth": 1920,
            "fmvFrameHeight": 1080,
            "fmvFrameCount": 100,
            "fmvVideoUrl": "https://example.test/v.mp4",
            "frameIdToBBox": {
                "10": [[-1.0, 1.0], [1.0, 1.0], [1.0, -1.0], [-1.0, -1.0]],
                "20": [[-2.0, 2.0], [2.0, 2.0], [2.0, -2.0], [-2.0, -2.0]]
            }
        }))
        .unwrap()
    }

    #[test]
    fn exact_frame_bounds_win() {
        let quad = metadata().bounds_at_frame(10).unwrap();
        assert_eq!(quad.corners[0].lng, -1.0);
    }

    #[test]
    fn missing_frame_uses_nearest_greater() {
        let quad = metadata().bounds_at_frame(12).unwrap();
        assert_eq!(quad.corners[0].lng, -2.0);
    }

    #[test]
    fn past_last_keyed_frame_has_no_bounds() {
        assert!(metadata().bounds_at_frame(50).is_none());
    }

    #[test]
    fn empty_bounds_yield_none() {
        let meta: VideoMetadata = serde_json::from_value(json!({})).unwrap();
        assert!(meta.bounds_at_frame(0).is_none());
        assert_eq!(meta.fps, 30.0);
    }
}
