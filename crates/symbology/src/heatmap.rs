use catalog::style::{HeatmapWeight, NumberColorPair, SizeConfig};
use foundation::color::{ColorParseError, Rgb};
use serde_json::{Value, json};

use crate::expr::Expr;
use crate::size::{size_linear, size_zoom};

/// Default density ramp used when a heatmap sub-layer configures no custom
/// colors. Transparent at zero density so empty areas stay clear.
pub fn default_ramp() -> Expr {
    Expr::Interpolate {
        input: Box::new(Expr::HeatmapDensity),
        stops: vec![
            (0.0, Expr::lit("rgba(33,102,172,0)")),
            (0.2, Expr::lit("rgb(103,169,207)")),
            (0.4, Expr::lit("rgb(209,229,240)")),
            (0.6, Expr::lit("rgb(253,219,199)")),
            (0.8, Expr::lit("rgb(239,138,98)")),
            (1.0, Expr::lit("rgb(178,24,43)")),
        ],
    }
}

/// Density ramp from configured `[density, hex color]` stops.
///
/// The first stop is forced fully transparent so zero-density areas do not
/// tint the whole viewport; later stops keep their configured color.
pub fn color_ramp(stops: &[NumberColorPair]) -> Result<Expr, ColorParseError> {
    let mut out = Vec::with_capacity(stops.len());
    for (i, stop) in stops.iter().enumerate() {
        let rgb = Rgb::parse_hex(&stop.color)?;
        let color = if i == 0 {
            rgb.to_rgba_string(0.0)
        } else {
            rgb.to_rgb_string()
        };
        out.push((stop.value, Expr::lit(color)));
    }
    Ok(Expr::Interpolate {
        input: Box::new(Expr::HeatmapDensity),
        stops: out,
    })
}

/// Paint value for heatmap weight or intensity.
pub fn compile_weight(weight: &HeatmapWeight) -> Value {
    match weight {
        HeatmapWeight::Static(value) => json!(value),
        HeatmapWeight::Linear(SizeConfig::SizeLinear(config)) => size_linear(config).to_json(),
        HeatmapWeight::Linear(SizeConfig::SizeZoom(config)) => size_zoom(config).to_json(),
    }
}

#[cfg(test)]
mod tests {
    use catalog::style::NumberColorPair;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{color_ramp, default_ramp};

    #[test]
    fn first_stop_is_transparent() {
        let ramp = color_ramp(&[
            NumberColorPair {
                value: 0.0,
                color: "#2166ac".to_string(),
            },
            NumberColorPair {
                value: 1.0,
                color: "#b2182b".to_string(),
            },
        ])
        .unwrap();
        assert_eq!(
            ramp.to_json(),
            json!([
                "interpolate",
                ["linear"],
                ["heatmap-density"],
                0.0,
                "rgba(33, 102, 172, 0)",
                1.0,
                "rgb(178, 24, 43)"
            ])
        );
    }

    #[test]
    fn default_ramp_starts_transparent() {
        let json = default_ramp().to_json();
        assert_eq!(json[3], json!(0.0));
        assert_eq!(json[4], json!("rgba(33,102,172,0)"));
    }

    #[test]
    fn bad_hex_is_rejected() {
        assert!(
            color_ramp(&[NumberColorPair {
                value: 0.0,
                color: "not-a-color".to_string(),
            }])
            .is_err()
        );
    }
}
