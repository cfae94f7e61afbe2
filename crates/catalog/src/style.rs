use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::filter::Filter;

/// One renderable styling unit within a vector layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AnnotationType {
    #[serde(rename = "fill")]
    Fill,
    #[serde(rename = "line")]
    Line,
    #[serde(rename = "circle")]
    Circle,
    #[serde(rename = "fill-extrusion")]
    FillExtrusion,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "heatmap")]
    Heatmap,
}

impl AnnotationType {
    /// All sub-layer types, in the order sub-layers are created and updated.
    pub const ALL: [AnnotationType; 6] = [
        AnnotationType::Fill,
        AnnotationType::FillExtrusion,
        AnnotationType::Circle,
        AnnotationType::Line,
        AnnotationType::Text,
        AnnotationType::Heatmap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationType::Fill => "fill",
            AnnotationType::Line => "line",
            AnnotationType::Circle => "circle",
            AnnotationType::FillExtrusion => "fill-extrusion",
            AnnotationType::Text => "text",
            AnnotationType::Heatmap => "heatmap",
        }
    }

    /// Paint property carrying this sub-layer's color.
    pub fn color_property(&self) -> Option<&'static str> {
        match self {
            AnnotationType::Fill => Some("fill-color"),
            AnnotationType::Line => Some("line-color"),
            AnnotationType::Circle => Some("circle-color"),
            AnnotationType::FillExtrusion => Some("fill-extrusion-color"),
            AnnotationType::Text => Some("text-color"),
            AnnotationType::Heatmap => None,
        }
    }

    pub fn opacity_property(&self) -> &'static str {
        match self {
            AnnotationType::Fill => "fill-opacity",
            AnnotationType::Line => "line-opacity",
            AnnotationType::Circle => "circle-opacity",
            AnnotationType::FillExtrusion => "fill-extrusion-opacity",
            AnnotationType::Text => "text-opacity",
            AnnotationType::Heatmap => "heatmap-opacity",
        }
    }

    /// Size property, where size is meaningful for the geometry kind.
    ///
    /// Fill types have no size; text size is a layout property, not paint.
    pub fn size_property(&self) -> Option<(&'static str, PropertyTarget)> {
        match self {
            AnnotationType::Circle => Some(("circle-radius", PropertyTarget::Paint)),
            AnnotationType::Line => Some(("line-width", PropertyTarget::Paint)),
            AnnotationType::Text => Some(("text-size", PropertyTarget::Layout)),
            _ => None,
        }
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a property is set through the paint or the layout channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PropertyTarget {
    Paint,
    Layout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    MissingDefaultColor { annotation: String },
    EmptyColorPairs { annotation: String },
}

impl fmt::Display for StyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleError::MissingDefaultColor { annotation } => {
                write!(f, "color spec for `{annotation}` has no default color")
            }
            StyleError::EmptyColorPairs { annotation } => {
                write!(f, "color spec for `{annotation}` has no color pairs")
            }
        }
    }
}

impl std::error::Error for StyleError {}

/// Declarative description of how a feature's color is derived.
///
/// Every non-solid variant terminates in an explicit default color so each
/// feature receives one; missing defaults are rejected at validation time,
/// never discovered during expression compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ColorSpec {
    #[serde(rename = "ColorAttributeValue", rename_all = "camelCase")]
    AttributeValue {
        default_color: String,
        /// Cascading attribute list: the first attribute present on a
        /// feature wins, not the most specific.
        attribute_values: Vec<String>,
    },
    #[serde(rename = "ColorCategoricalString", rename_all = "camelCase")]
    CategoricalString {
        default_color: String,
        attribute: String,
        color_pairs: BTreeMap<String, String>,
    },
    #[serde(rename = "ColorCategoricalNumber", rename_all = "camelCase")]
    CategoricalNumber {
        default_color: String,
        attribute: String,
        number_color_pairs: Vec<NumberColorPair>,
    },
    #[serde(rename = "ColorLinearNumber", rename_all = "camelCase")]
    LinearNumber {
        default_color: String,
        attribute: String,
        number_color_pairs: Vec<NumberColorPair>,
    },
    #[serde(rename = "ColorBoolean", rename_all = "camelCase")]
    Boolean {
        default_color: String,
        attribute: String,
        true_color: String,
        false_color: String,
    },
}

impl ColorSpec {
    pub fn validate(&self, annotation: &str) -> Result<(), StyleError> {
        let default_color = match self {
            ColorSpec::AttributeValue { default_color, .. }
            | ColorSpec::CategoricalString { default_color, .. }
            | ColorSpec::CategoricalNumber { default_color, .. }
            | ColorSpec::LinearNumber { default_color, .. }
            | ColorSpec::Boolean { default_color, .. } => default_color,
        };
        if default_color.is_empty() {
            return Err(StyleError::MissingDefaultColor {
                annotation: annotation.to_string(),
            });
        }
        match self {
            ColorSpec::CategoricalNumber {
                number_color_pairs, ..
            }
            | ColorSpec::LinearNumber {
                number_color_pairs, ..
            } if number_color_pairs.is_empty() => Err(StyleError::EmptyColorPairs {
                annotation: annotation.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberColorPair {
    pub value: f64,
    pub color: String,
}

/// Solid color or data-driven color spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorDisplay {
    Solid(String),
    Spec(ColorSpec),
}

/// `false`, `true`, or single-select mode.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SelectableRepr", into = "SelectableRepr")]
pub enum Selectable {
    #[default]
    No,
    Multi,
    Single,
}

impl Selectable {
    pub fn is_selectable(&self) -> bool {
        !matches!(self, Selectable::No)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SelectableRepr {
    Flag(bool),
    Mode(String),
}

impl From<SelectableRepr> for Selectable {
    fn from(repr: SelectableRepr) -> Self {
        match repr {
            SelectableRepr::Flag(false) => Selectable::No,
            SelectableRepr::Flag(true) => Selectable::Multi,
            SelectableRepr::Mode(mode) if mode == "singleSelect" => Selectable::Single,
            SelectableRepr::Mode(_) => Selectable::Multi,
        }
    }
}

impl From<Selectable> for SelectableRepr {
    fn from(value: Selectable) -> Self {
        match value {
            Selectable::No => SelectableRepr::Flag(false),
            Selectable::Multi => SelectableRepr::Flag(true),
            Selectable::Single => SelectableRepr::Mode("singleSelect".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeZoom {
    /// `[zoom, size]` stops.
    pub zoom_levels: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeLinear {
    pub attribute: String,
    /// `[attribute value, size]` stops.
    pub linear_levels: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SizeConfig {
    SizeZoom(SizeZoom),
    SizeLinear(SizeLinear),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeSpec {
    Static(f64),
    Config(SizeConfig),
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl ZoomRange {
    pub fn is_set(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextConfig {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeatmapWeight {
    Static(f64),
    Linear(SizeConfig),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapConfig {
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub weight: Option<HeatmapWeight>,
    #[serde(default)]
    pub intensity: Option<HeatmapWeight>,
    /// `[density, color]` ramp stops.
    #[serde(default)]
    pub color: Option<Vec<NumberColorPair>>,
}

/// Per-sub-layer display configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub color: Option<ColorDisplay>,
    #[serde(default)]
    pub select_color: Option<String>,
    #[serde(default)]
    pub selectable: Selectable,
    #[serde(default)]
    pub hoverable: bool,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub size: Option<SizeSpec>,
    #[serde(default)]
    pub text: Option<TextConfig>,
    #[serde(default)]
    pub zoom: Option<ZoomRange>,
    #[serde(default)]
    pub heatmap: Option<HeatmapConfig>,
    #[serde(default)]
    pub draw_points: bool,
}

impl DisplayConfig {
    /// Whether the sub-layer renders at all: visible unless explicitly
    /// disabled.
    pub fn is_visible(&self) -> bool {
        self.enabled != Some(false)
    }

    /// Whether composed filters are applied to this sub-layer. Filters are
    /// only attached to explicitly enabled sub-layers.
    pub fn filters_apply(&self) -> bool {
        self.enabled == Some(true)
    }
}

/// `false`/`true` shorthand or a full display config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VectorLayerDisplay {
    Toggle(bool),
    Config(DisplayConfig),
}

impl VectorLayerDisplay {
    pub fn config(&self) -> Option<&DisplayConfig> {
        match self {
            VectorLayerDisplay::Config(config) => Some(config),
            VectorLayerDisplay::Toggle(_) => None,
        }
    }
}

/// A vector layer's full style blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorStyle {
    #[serde(default)]
    pub layers: BTreeMap<AnnotationType, VectorLayerDisplay>,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl VectorStyle {
    pub fn display_config(&self, annotation: AnnotationType) -> Option<&DisplayConfig> {
        self.layers.get(&annotation).and_then(|d| d.config())
    }

    pub fn display_config_mut(&mut self, annotation: AnnotationType) -> Option<&mut DisplayConfig> {
        match self.layers.get_mut(&annotation) {
            Some(VectorLayerDisplay::Config(config)) => Some(config),
            _ => None,
        }
    }

    /// Validates every color spec in the style. Run after fetch/edit so bad
    /// configuration fails here, not inside expression compilation.
    pub fn validate(&self) -> Result<(), StyleError> {
        for (annotation, display) in &self.layers {
            let Some(config) = display.config() else {
                continue;
            };
            if let Some(ColorDisplay::Spec(spec)) = &config.color {
                spec.validate(annotation.as_str())?;
            }
        }
        Ok(())
    }

    /// Whether the line sub-layer asks for points to be drawn alongside it.
    pub fn draw_points(&self) -> bool {
        self.display_config(AnnotationType::Line)
            .is_some_and(|c| c.draw_points)
    }
}
