use catalog::style::{SizeConfig, SizeLinear, SizeSpec, SizeZoom};
use serde_json::{Value, json};

use crate::expr::{Expr, interpolate_stops};

/// Zoom-driven size: interpolated over `["zoom"]` with ascending stops.
pub fn size_zoom(config: &SizeZoom) -> Expr {
    interpolate_stops(
        Expr::Zoom,
        config
            .zoom_levels
            .iter()
            .map(|(zoom, size)| (*zoom, Expr::lit(*size)))
            .collect(),
    )
}

/// Attribute-driven size: interpolated over the attribute value.
pub fn size_linear(config: &SizeLinear) -> Expr {
    interpolate_stops(
        Expr::get(config.attribute.as_str()),
        config
            .linear_levels
            .iter()
            .map(|(value, size)| (*value, Expr::lit(*size)))
            .collect(),
    )
}

/// Paint/layout value for a size spec. Static sizes stay plain numbers.
pub fn compile_size(spec: &SizeSpec) -> Value {
    match spec {
        SizeSpec::Static(size) => json!(size),
        SizeSpec::Config(SizeConfig::SizeZoom(config)) => size_zoom(config).to_json(),
        SizeSpec::Config(SizeConfig::SizeLinear(config)) => size_linear(config).to_json(),
    }
}

#[cfg(test)]
mod tests {
    use catalog::style::{SizeConfig, SizeLinear, SizeSpec, SizeZoom};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::compile_size;

    #[test]
    fn static_size_is_plain_number() {
        assert_eq!(compile_size(&SizeSpec::Static(4.0)), json!(4.0));
    }

    #[test]
    fn zoom_size_sorts_stops_ascending() {
        let spec = SizeSpec::Config(SizeConfig::SizeZoom(SizeZoom {
            zoom_levels: vec![(14.0, 1.0), (5.0, 10.0)],
        }));
        assert_eq!(
            compile_size(&spec),
            json!(["interpolate", ["linear"], ["zoom"], 5.0, 10.0, 14.0, 1.0])
        );
    }

    #[test]
    fn linear_size_reads_attribute() {
        let spec = SizeSpec::Config(SizeConfig::SizeLinear(SizeLinear {
            attribute: "magnitude".to_string(),
            linear_levels: vec![(0.0, 2.0), (9.0, 20.0)],
        }));
        assert_eq!(
            compile_size(&spec),
            json!(["interpolate", ["linear"], ["get", "magnitude"], 0.0, 2.0, 9.0, 20.0])
        );
    }
}
