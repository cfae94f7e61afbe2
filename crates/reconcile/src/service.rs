use std::fmt;

use catalog::netcdf::NetCdfFrames;
use catalog::raster::{RasterBandStyle, RasterMetadata};
use catalog::video::VideoMetadata;
use foundation::ids::LayerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    NotFound { layer: LayerId },
    Fetch { layer: LayerId, message: String },
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::NotFound { layer } => {
                write!(f, "no auxiliary data for layer {layer}")
            }
            ServiceError::Fetch { layer, message } => {
                write!(f, "fetch failed for layer {layer}: {message}")
            }
        }
    }
}

impl std::error::Error for ServiceError {}

/// Backend API collaborator for per-layer auxiliary data.
///
/// No retries anywhere: a failed fetch is terminal for that request, logged
/// by the caller, and the layer stays un-rendered until the next pass.
pub trait LayerService {
    fn netcdf_frames(&self, layer: LayerId) -> Result<NetCdfFrames, ServiceError>;
    fn video_metadata(&self, layer: LayerId) -> Result<VideoMetadata, ServiceError>;
    fn raster_metadata(&self, layer: LayerId) -> Result<RasterMetadata, ServiceError>;
}

/// Tile URL templates for the backend's tile endpoints.
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    base: String,
}

impl ApiEndpoints {
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    pub fn vector_tile_template(&self, id: LayerId) -> String {
        format!("{}/vectors/{id}/tiles/{{z}}/{{x}}/{{y}}/", self.base)
    }

    /// Raster tile template. Band styling is server-interpreted, delivered
    /// as a percent-encoded JSON query parameter; disabled bands are dropped
    /// before encoding.
    pub fn raster_tile_template(&self, id: LayerId, style: &RasterBandStyle) -> String {
        let style_json =
            serde_json::to_string(&style.enabled_bands()).unwrap_or_else(|_| "{}".to_string());
        format!(
            "{}/rasters/{id}/tiles/{{z}}/{{x}}/{{y}}.png/?projection=EPSG%3A3857&style={}",
            self.base,
            percent_encode(&style_json)
        )
    }

    pub fn video_tile_template(&self, id: LayerId) -> String {
        format!("{}/fmv-layer/{id}/tiles/{{z}}/{{x}}/{{y}}/", self.base)
    }
}

/// Minimal query-component percent encoding (RFC 3986 unreserved set).
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use catalog::netcdf::NetCdfFrames;
    use catalog::raster::RasterMetadata;
    use catalog::video::VideoMetadata;
    use foundation::ids::LayerId;

    use super::{LayerService, ServiceError};

    /// Canned-response service for reconciler tests.
    #[derive(Default)]
    pub struct StubService {
        pub netcdf: BTreeMap<LayerId, NetCdfFrames>,
        pub video: BTreeMap<LayerId, VideoMetadata>,
        pub raster: BTreeMap<LayerId, RasterMetadata>,
        pub calls: RefCell<Vec<LayerId>>,
    }

    impl LayerService for StubService {
        fn netcdf_frames(&self, layer: LayerId) -> Result<NetCdfFrames, ServiceError> {
            self.calls.borrow_mut().push(layer);
            self.netcdf
                .get(&layer)
                .cloned()
                .ok_or(ServiceError::NotFound { layer })
        }

        fn video_metadata(&self, layer: LayerId) -> Result<VideoMetadata, ServiceError> {
            self.calls.borrow_mut().push(layer);
            self.video
                .get(&layer)
                .cloned()
                .ok_or(ServiceError::NotFound { layer })
        }

        fn raster_metadata(&self, layer: LayerId) -> Result<RasterMetadata, ServiceError> {
            self.calls.borrow_mut().push(layer);
            self.raster
                .get(&layer)
                .cloned()
                .ok_or(ServiceError::NotFound { layer })
        }
    }
}

#[cfg(test)]
mod tests {
    use catalog::raster::RasterBandStyle;
    use foundation::ids::LayerId;
    use pretty_assertions::assert_eq;

    use super::ApiEndpoints;

    #[test]
    fn templates_keep_tile_placeholders() {
        let api = ApiEndpoints::new("https://example.test/api/v1/");
        assert_eq!(
            api.vector_tile_template(LayerId(7)),
            "https://example.test/api/v1/vectors/7/tiles/{z}/{x}/{y}/"
        );
    }

    #[test]
    fn raster_template_encodes_style_json() {
        let api = ApiEndpoints::new("https://example.test/api/v1");
        let url = api.raster_tile_template(LayerId(2), &RasterBandStyle::default());
        assert!(url.contains("projection=EPSG%3A3857"));
        assert!(url.contains("style=%7B%22bands%22%3A%5B%5D%7D"));
    }
}
