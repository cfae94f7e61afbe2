use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::style::{Selectable, ZoomRange};

/// Per-band min/max bound: a concrete value, or the band's full range
/// (`"min"`/`"max"` on the wire).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BandLimitRepr", into = "BandLimitRepr")]
pub enum BandLimit {
    Min,
    Max,
    Value(f64),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum BandLimitRepr {
    Name(String),
    Number(f64),
}

impl TryFrom<BandLimitRepr> for BandLimit {
    type Error = String;

    fn try_from(repr: BandLimitRepr) -> Result<Self, Self::Error> {
        match repr {
            BandLimitRepr::Name(name) if name == "min" => Ok(BandLimit::Min),
            BandLimitRepr::Name(name) if name == "max" => Ok(BandLimit::Max),
            BandLimitRepr::Name(name) => Err(format!("unknown band limit `{name}`")),
            BandLimitRepr::Number(value) => Ok(BandLimit::Value(value)),
        }
    }
}

impl From<BandLimit> for BandLimitRepr {
    fn from(limit: BandLimit) -> Self {
        match limit {
            BandLimit::Min => BandLimitRepr::Name("min".to_string()),
            BandLimit::Max => BandLimitRepr::Name("max".to_string()),
            BandLimit::Value(v) => BandLimitRepr::Number(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandStyle {
    pub band: String,
    pub enabled: bool,
    pub min: BandLimit,
    pub max: BandLimit,
    /// `false` renders values outside min/max transparent.
    pub clamp: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<String>,
}

/// Server-interpreted band styling, delivered as a query parameter embedded
/// in the tile URL template rather than as a client expression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RasterBandStyle {
    #[serde(default)]
    pub bands: Vec<BandStyle>,
}

impl RasterBandStyle {
    /// Copy with disabled bands removed, the form encoded into tile URLs.
    pub fn enabled_bands(&self) -> RasterBandStyle {
        RasterBandStyle {
            bands: self
                .bands
                .iter()
                .filter(|band| band.enabled)
                .cloned()
                .collect(),
        }
    }
}

/// A raster layer's style blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterStyle {
    #[serde(default)]
    pub large_image_style: Option<RasterBandStyle>,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub selectable: Selectable,
    #[serde(default)]
    pub hoverable: bool,
    #[serde(default)]
    pub zoom: Option<ZoomRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandMetadata {
    pub interpretation: String,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// Backend raster metadata, keyed by band index as a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RasterMetadata {
    #[serde(default)]
    pub bands: BTreeMap<String, BandMetadata>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{BandLimit, RasterBandStyle, RasterStyle};

    #[test]
    fn parses_band_limits() {
        let style: RasterBandStyle = serde_json::from_value(json!({
            "bands": [
                {"band": "1", "enabled": true, "min": "min", "max": 200.0, "clamp": false}
            ]
        }))
        .unwrap();
        assert_eq!(style.bands[0].min, BandLimit::Min);
        assert_eq!(style.bands[0].max, BandLimit::Value(200.0));
    }

    #[test]
    fn enabled_bands_drops_disabled() {
        let style: RasterBandStyle = serde_json::from_value(json!({
            "bands": [
                {"band": "1", "enabled": true, "min": "min", "max": "max", "clamp": false},
                {"band": "2", "enabled": false, "min": "min", "max": "max", "clamp": false}
            ]
        }))
        .unwrap();
        let enabled = style.enabled_bands();
        assert_eq!(enabled.bands.len(), 1);
        assert_eq!(enabled.bands[0].band, "1");
    }

    #[test]
    fn default_style_is_empty() {
        let style: RasterStyle = serde_json::from_value(json!({})).unwrap();
        assert!(style.large_image_style.is_none());
        assert!(!style.hoverable);
    }
}
