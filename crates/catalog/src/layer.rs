use foundation::ids::{DatasetId, LayerId, LayerKey, LayerKind};
use serde::{Deserialize, Serialize};

use crate::raster::RasterStyle;
use crate::style::VectorStyle;

/// A map layer as delivered by the catalog API, discriminated by kind.
///
/// Ids are only unique within a kind; use [`MapLayer::key`] wherever layers
/// of different kinds mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MapLayer {
    Vector(VectorMapLayer),
    Raster(RasterMapLayer),
    #[serde(rename = "netcdf")]
    NetCdf(NetCdfMapLayer),
    #[serde(rename = "fmv")]
    Video(VideoMapLayer),
}

impl MapLayer {
    pub fn kind(&self) -> LayerKind {
        match self {
            MapLayer::Vector(_) => LayerKind::Vector,
            MapLayer::Raster(_) => LayerKind::Raster,
            MapLayer::NetCdf(_) => LayerKind::NetCdf,
            MapLayer::Video(_) => LayerKind::Video,
        }
    }

    pub fn id(&self) -> LayerId {
        match self {
            MapLayer::Vector(l) => l.id,
            MapLayer::Raster(l) => l.id,
            MapLayer::NetCdf(l) => l.id,
            MapLayer::Video(l) => l.id,
        }
    }

    pub fn key(&self) -> LayerKey {
        LayerKey::new(self.kind(), self.id())
    }

    pub fn name(&self) -> &str {
        match self {
            MapLayer::Vector(l) => &l.name,
            MapLayer::Raster(l) => &l.name,
            MapLayer::NetCdf(l) => &l.name,
            MapLayer::Video(l) => &l.name,
        }
    }

    pub fn dataset_id(&self) -> Option<DatasetId> {
        match self {
            MapLayer::Vector(l) => l.dataset_id,
            MapLayer::Raster(l) => l.dataset_id,
            MapLayer::NetCdf(l) => l.dataset_id,
            MapLayer::Video(l) => l.dataset_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMapLayer {
    pub id: LayerId,
    pub name: String,
    #[serde(default)]
    pub dataset_id: Option<DatasetId>,
    #[serde(default)]
    pub default_style: VectorStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterMapLayer {
    pub id: LayerId,
    pub name: String,
    #[serde(default)]
    pub dataset_id: Option<DatasetId>,
    #[serde(default)]
    pub default_style: RasterStyle,
}

/// NetCDF layer record. Frame images are fetched separately and cached by
/// the reconciler, keyed by this layer's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetCdfMapLayer {
    pub id: LayerId,
    pub name: String,
    #[serde(default)]
    pub dataset_id: Option<DatasetId>,
}

/// Full-motion-video layer record. Per-frame metadata is fetched separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMapLayer {
    pub id: LayerId,
    pub name: String,
    #[serde(default)]
    pub dataset_id: Option<DatasetId>,
}
