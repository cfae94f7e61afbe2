use catalog::style::{ColorDisplay, ColorSpec, DisplayConfig, NumberColorPair};
use foundation::ids::FeatureId;
use serde_json::{Value, json};

use crate::expr::{CompareOp, Expr};

/// Feature attribute carrying the backend feature id inside tile properties.
pub const FEATURE_ID_ATTRIBUTE: &str = "vectorfeatureid";

/// Selection highlight used when a sub-layer does not configure its own.
/// The color scale skips the near-cyan hue band so generated palettes never
/// collide with it.
pub const DEFAULT_HIGHLIGHT: &str = "cyan";

/// Read-only selection/hover state consumed by color compilation.
///
/// Mutating the underlying sets never recolors synchronously; the store queues
/// a recolor invalidation and the next recompute reads the current snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionContext {
    pub selected_ids: Vec<FeatureId>,
    pub hovered_ids: Vec<FeatureId>,
    /// Hovered features are only tinted while a detail sidebar is open.
    pub hover_highlight: bool,
    /// Per-feature manual color overrides, applied after selection/hover
    /// branches and before the base expression.
    pub color_overrides: Vec<(FeatureId, String)>,
    pub overrides_enabled: bool,
}

impl SelectionContext {
    /// Conditional branches prepended to every highlighted color expression:
    /// selected ids, hovered ids (sidebar-gated), then manual overrides.
    fn highlight_branches(&self, highlight: &str) -> Vec<(Expr, Expr)> {
        let mut branches = vec![(
            Expr::is_in(
                Expr::get(FEATURE_ID_ATTRIBUTE),
                self.selected_ids.iter().map(|id| json!(id.0)).collect(),
            ),
            Expr::lit(highlight),
        )];
        if self.hover_highlight {
            branches.push((
                Expr::is_in(
                    Expr::get(FEATURE_ID_ATTRIBUTE),
                    self.hovered_ids.iter().map(|id| json!(id.0)).collect(),
                ),
                Expr::lit(highlight),
            ));
        }
        if self.overrides_enabled {
            for (id, color) in &self.color_overrides {
                branches.push((
                    Expr::eq(Expr::get(FEATURE_ID_ATTRIBUTE), Expr::lit(id.0)),
                    Expr::lit(color.as_str()),
                ));
            }
        }
        branches
    }
}

/// Compiles a sub-layer's color configuration to a paint value.
///
/// Solid colors without a select color stay plain strings; everything else
/// becomes an expression. `None` when the config carries no color at all.
pub fn compile_display_color(config: &DisplayConfig, ctx: &SelectionContext) -> Option<Value> {
    let color = config.color.as_ref()?;
    Some(compile_color(color, config.select_color.as_deref(), ctx))
}

pub fn compile_color(color: &ColorDisplay, select_color: Option<&str>, ctx: &SelectionContext) -> Value {
    match color {
        ColorDisplay::Solid(solid) => match select_color {
            Some(highlight) => Expr::Case {
                branches: ctx.highlight_branches(highlight),
                fallback: Some(Box::new(Expr::lit(solid.as_str()))),
            }
            .to_json(),
            None => Value::String(solid.clone()),
        },
        ColorDisplay::Spec(spec) => {
            let branches = select_color
                .map(|highlight| ctx.highlight_branches(highlight))
                .unwrap_or_default();
            compile_spec(spec, branches)
        }
    }
}

fn compile_spec(spec: &ColorSpec, branches: Vec<(Expr, Expr)>) -> Value {
    match spec {
        ColorSpec::CategoricalString {
            default_color,
            attribute,
            color_pairs,
        } => {
            let mut branches = branches;
            for (label, color) in color_pairs {
                branches.push((
                    Expr::eq(Expr::get(attribute.as_str()), Expr::lit(label.as_str())),
                    Expr::lit(color.as_str()),
                ));
            }
            Expr::Case {
                branches,
                fallback: Some(Box::new(Expr::lit(default_color.as_str()))),
            }
            .to_json()
        }
        ColorSpec::AttributeValue {
            default_color,
            attribute_values,
        } => attribute_value_cascade(default_color, attribute_values, branches),
        ColorSpec::CategoricalNumber {
            attribute,
            number_color_pairs,
            ..
        } => categorical_number(attribute, number_color_pairs, branches),
        ColorSpec::LinearNumber {
            attribute,
            number_color_pairs,
            ..
        } => {
            let interpolate = linear_interpolation(attribute, number_color_pairs);
            if branches.is_empty() {
                // Standalone linear color must be a root interpolate node,
                // not wrapped in a single-branch case.
                interpolate.to_json()
            } else {
                Expr::Case {
                    branches,
                    fallback: Some(Box::new(interpolate)),
                }
                .to_json()
            }
        }
        ColorSpec::Boolean {
            attribute,
            true_color,
            false_color,
            ..
        } => {
            let mut branches = branches;
            branches.push((
                Expr::eq(Expr::get(attribute.as_str()), Expr::lit(true)),
                Expr::lit(true_color.as_str()),
            ));
            Expr::Case {
                branches,
                fallback: Some(Box::new(Expr::lit(false_color.as_str()))),
            }
            .to_json()
        }
    }
}

/// First-present-attribute cascade. The FIRST attribute in the list that
/// exists on a feature wins, not the most specific one.
fn attribute_value_cascade(
    default_color: &str,
    attribute_values: &[String],
    mut branches: Vec<(Expr, Expr)>,
) -> Value {
    for attribute in attribute_values {
        // Attribute values hold colors as `#RRGGBB` prefixes.
        branches.push((
            Expr::has(attribute.as_str()),
            Expr::Let {
                name: "firstColor".to_string(),
                value: Box::new(Expr::Slice {
                    input: Box::new(Expr::get(attribute.as_str())),
                    start: 0,
                    end: 7,
                }),
                body: Box::new(Expr::ToColor(Box::new(Expr::Var(
                    "firstColor".to_string(),
                )))),
            },
        ));
        // Named-color fallback for features carrying a `color` attribute.
        branches.push((
            Expr::has("color"),
            Expr::Match {
                input: Box::new(Expr::get(attribute.as_str())),
                arms: vec![
                    (json!("light blue"), Expr::lit("#ADD8E6")),
                    (json!("dark blue"), Expr::lit("#00008B")),
                ],
                fallback: Box::new(Expr::get(attribute.as_str())),
            },
        ));
    }
    Expr::Case {
        branches,
        fallback: Some(Box::new(Expr::lit(default_color))),
    }
    .to_json()
}

/// Cumulative `<=` threshold chain sorted ascending.
///
/// Values above the last threshold fall back to the FIRST sorted pair's
/// color. Product has been asked to confirm whether the fallback should be
/// the last pair instead; until then this matches shipped behavior.
fn categorical_number(
    attribute: &str,
    pairs: &[NumberColorPair],
    mut branches: Vec<(Expr, Expr)>,
) -> Value {
    let mut sorted: Vec<&NumberColorPair> = pairs.iter().collect();
    sorted.sort_by(|a, b| a.value.total_cmp(&b.value));
    for pair in &sorted {
        branches.push((
            Expr::compare(CompareOp::Le, Expr::get(attribute), Expr::lit(pair.value)),
            Expr::lit(pair.color.as_str()),
        ));
    }
    let fallback = sorted
        .first()
        .map(|pair| pair.color.clone())
        .unwrap_or_default();
    Expr::Case {
        branches,
        fallback: Some(Box::new(Expr::lit(fallback))),
    }
    .to_json()
}

fn linear_interpolation(attribute: &str, pairs: &[NumberColorPair]) -> Expr {
    let stops = pairs
        .iter()
        .map(|pair| (pair.value, Expr::lit(pair.color.as_str())))
        .collect();
    crate::expr::interpolate_stops(Expr::get(attribute), stops)
}

#[cfg(test)]
mod tests {
    use catalog::style::{ColorDisplay, ColorSpec, NumberColorPair};
    use foundation::ids::FeatureId;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{SelectionContext, compile_color};

    fn ctx() -> SelectionContext {
        SelectionContext {
            selected_ids: vec![FeatureId(3), FeatureId(9)],
            hovered_ids: vec![FeatureId(5)],
            hover_highlight: false,
            color_overrides: vec![],
            overrides_enabled: false,
        }
    }

    #[test]
    fn solid_color_without_select_color_stays_plain() {
        let out = compile_color(&ColorDisplay::Solid("#123456".to_string()), None, &ctx());
        assert_eq!(out, json!("#123456"));
    }

    #[test]
    fn solid_color_with_select_color_gains_selection_branch() {
        let out = compile_color(
            &ColorDisplay::Solid("#123456".to_string()),
            Some("cyan"),
            &ctx(),
        );
        assert_eq!(
            out,
            json!([
                "case",
                ["in", ["get", "vectorfeatureid"], ["literal", [3, 9]]],
                "cyan",
                "#123456"
            ])
        );
    }

    #[test]
    fn hover_branch_only_while_sidebar_open() {
        let mut context = ctx();
        context.hover_highlight = true;
        let out = compile_color(
            &ColorDisplay::Solid("#123456".to_string()),
            Some("cyan"),
            &context,
        );
        assert_eq!(
            out,
            json!([
                "case",
                ["in", ["get", "vectorfeatureid"], ["literal", [3, 9]]],
                "cyan",
                ["in", ["get", "vectorfeatureid"], ["literal", [5]]],
                "cyan",
                "#123456"
            ])
        );
    }

    #[test]
    fn overrides_come_after_selection_branches() {
        let mut context = ctx();
        context.overrides_enabled = true;
        context.color_overrides = vec![(FeatureId(7), "#ff0000".to_string())];
        let out = compile_color(
            &ColorDisplay::Solid("#fff".to_string()),
            Some("cyan"),
            &context,
        );
        assert_eq!(
            out,
            json!([
                "case",
                ["in", ["get", "vectorfeatureid"], ["literal", [3, 9]]],
                "cyan",
                ["==", ["get", "vectorfeatureid"], 7],
                "#ff0000",
                "#fff"
            ])
        );
    }

    #[test]
    fn categorical_number_falls_back_to_first_sorted_color() {
        let spec = ColorDisplay::Spec(ColorSpec::CategoricalNumber {
            default_color: "#888".to_string(),
            attribute: "pop".to_string(),
            number_color_pairs: vec![
                NumberColorPair {
                    value: 20.0,
                    color: "#b".to_string(),
                },
                NumberColorPair {
                    value: 10.0,
                    color: "#a".to_string(),
                },
            ],
        });
        let out = compile_color(&spec, None, &ctx());
        assert_eq!(
            out,
            json!([
                "case",
                ["<=", ["get", "pop"], 10.0],
                "#a",
                ["<=", ["get", "pop"], 20.0],
                "#b",
                "#a"
            ])
        );
    }

    #[test]
    fn linear_number_standalone_is_root_interpolate() {
        let spec = ColorDisplay::Spec(ColorSpec::LinearNumber {
            default_color: "#888".to_string(),
            attribute: "depth".to_string(),
            number_color_pairs: vec![
                NumberColorPair {
                    value: 1.0,
                    color: "#a".to_string(),
                },
                NumberColorPair {
                    value: 5.0,
                    color: "#b".to_string(),
                },
            ],
        });
        let out = compile_color(&spec, None, &ctx());
        assert_eq!(
            out,
            json!(["interpolate", ["linear"], ["get", "depth"], 1.0, "#a", 5.0, "#b"])
        );
    }

    #[test]
    fn linear_number_nests_under_selection_chain() {
        let spec = ColorDisplay::Spec(ColorSpec::LinearNumber {
            default_color: "#888".to_string(),
            attribute: "depth".to_string(),
            number_color_pairs: vec![NumberColorPair {
                value: 1.0,
                color: "#a".to_string(),
            }],
        });
        let out = compile_color(&spec, Some("cyan"), &ctx());
        assert_eq!(
            out,
            json!([
                "case",
                ["in", ["get", "vectorfeatureid"], ["literal", [3, 9]]],
                "cyan",
                ["interpolate", ["linear"], ["get", "depth"], 1.0, "#a"]
            ])
        );
    }

    #[test]
    fn boolean_is_two_branch_case() {
        let spec = ColorDisplay::Spec(ColorSpec::Boolean {
            default_color: "#888".to_string(),
            attribute: "active".to_string(),
            true_color: "#0f0".to_string(),
            false_color: "#f00".to_string(),
        });
        let out = compile_color(&spec, None, &ctx());
        assert_eq!(
            out,
            json!(["case", ["==", ["get", "active"], true], "#0f0", "#f00"])
        );
    }
}
