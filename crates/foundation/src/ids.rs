use std::fmt;

/// Backend-assigned map layer id. Unique within a layer kind, not across kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backend-assigned vector feature id, carried in tile feature properties.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FeatureId(pub u64);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct DatasetId(pub u64);

/// The four layer kinds the reconcilers know how to materialize.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LayerKind {
    Vector,
    Raster,
    NetCdf,
    #[cfg_attr(feature = "serde", serde(rename = "fmv"))]
    Video,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Vector => "vector",
            LayerKind::Raster => "raster",
            LayerKind::NetCdf => "netcdf",
            LayerKind::Video => "fmv",
        }
    }
}

/// Composite key identifying a layer across kinds.
///
/// Visibility membership is tracked by this key (`kind_id`), never by the
/// bare id, since ids are only unique per kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerKey {
    pub kind: LayerKind,
    pub id: LayerId,
}

impl LayerKey {
    pub fn new(kind: LayerKind, id: LayerId) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind.as_str(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::{LayerId, LayerKey, LayerKind};

    #[test]
    fn composite_key_format() {
        let key = LayerKey::new(LayerKind::Vector, LayerId(7));
        assert_eq!(key.to_string(), "vector_7");
        assert_eq!(
            LayerKey::new(LayerKind::NetCdf, LayerId(3)).to_string(),
            "netcdf_3"
        );
    }

    #[test]
    fn same_id_different_kind_is_distinct() {
        let a = LayerKey::new(LayerKind::Vector, LayerId(1));
        let b = LayerKey::new(LayerKind::Raster, LayerId(1));
        assert_ne!(a, b);
    }
}
