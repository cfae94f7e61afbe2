use foundation::geo::{GeoQuad, LngLat};
use foundation::ids::LayerId;
use serde::{Deserialize, Serialize};

/// Sliding dimension metadata for a NetCDF frame sequence (typically time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlidingRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub variable: String,
}

/// Pre-rendered NetCDF frame images plus their shared geographic placement.
///
/// `parent_bounds` comes off the wire as GeoJSON-style polygon rings whose
/// last coordinate repeats the first; only the first ring's first four
/// coordinates carry the quad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetCdfFrames {
    #[serde(rename = "netCDFLayer")]
    pub netcdf_layer: LayerId,
    pub images: Vec<String>,
    pub parent_bounds: Vec<Vec<[f64; 2]>>,
    #[serde(default)]
    pub sliding: Option<SlidingRange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetCdfError {
    MissingBounds,
    NoImages,
}

impl std::fmt::Display for NetCdfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetCdfError::MissingBounds => {
                write!(f, "netcdf frame data has no usable parent bounds ring")
            }
            NetCdfError::NoImages => write!(f, "netcdf frame data contains no images"),
        }
    }
}

impl std::error::Error for NetCdfError {}

impl NetCdfFrames {
    /// Placement quad for every frame image, normalized to the corner
    /// ordering the render surface expects.
    pub fn quad(&self) -> Result<GeoQuad, NetCdfError> {
        let ring = self
            .parent_bounds
            .first()
            .filter(|ring| ring.len() >= 4)
            .ok_or(NetCdfError::MissingBounds)?;
        let corners = [
            LngLat::new(ring[0][0], ring[0][1]),
            LngLat::new(ring[1][0], ring[1][1]),
            LngLat::new(ring[2][0], ring[2][1]),
            LngLat::new(ring[3][0], ring[3][1]),
        ];
        Ok(GeoQuad::normalized(corners))
    }

    pub fn frame_count(&self) -> usize {
        self.images.len()
    }

    pub fn image_at(&self, index: usize) -> Option<&str> {
        self.images.get(index).map(String::as_str)
    }
}

/// Image resampling mode for NetCDF frame sources.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resampling {
    #[default]
    Linear,
    Nearest,
}

impl Resampling {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resampling::Linear => "linear",
            Resampling::Nearest => "nearest",
        }
    }
}
