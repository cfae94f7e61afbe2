use std::collections::BTreeMap;

use catalog::filter::{AnnotationScope, ColorFilter, Comparison, Filter, Predicate};
use catalog::style::{AnnotationType, VectorStyle};
use serde_json::json;

use crate::expr::{CompareOp, Expr};

/// Compiles one attribute filter to an expression.
pub fn compile_filter(filter: &Filter) -> Expr {
    compile_predicate(&filter.key, &filter.predicate)
}

pub fn compile_predicate(key: &str, predicate: &Predicate) -> Expr {
    match predicate {
        Predicate::NumberCompare { op, value } => {
            Expr::compare(compare_op(*op), Expr::get(key), Expr::lit(*value))
        }
        // Inclusive at both boundaries.
        Predicate::NumberBetween { min, max } => Expr::All(vec![
            Expr::compare(CompareOp::Ge, Expr::get(key), Expr::lit(*min)),
            Expr::compare(CompareOp::Le, Expr::get(key), Expr::lit(*max)),
        ]),
        Predicate::StringEquals(value) => {
            Expr::eq(Expr::get(key), Expr::lit(value.as_str()))
        }
        Predicate::StringContains(value) => Expr::Match {
            input: Box::new(Expr::get(key)),
            arms: vec![(json!([value]), Expr::lit(true))],
            fallback: Box::new(Expr::lit(false)),
        },
        Predicate::StringIn(values) => Expr::is_in(
            Expr::get(key),
            values.iter().map(|v| json!(v)).collect(),
        ),
        Predicate::BoolEquals(value) => Expr::eq(Expr::get(key), Expr::lit(*value)),
    }
}

fn compare_op(op: Comparison) -> CompareOp {
    match op {
        Comparison::Gt => CompareOp::Gt,
        Comparison::Lt => CompareOp::Lt,
        Comparison::Ge => CompareOp::Ge,
        Comparison::Le => CompareOp::Le,
        Comparison::Eq => CompareOp::Eq,
    }
}

/// Negated membership: hide features whose value for `key` is excluded.
pub fn compile_color_filter(filter: &ColorFilter) -> Expr {
    Expr::not(Expr::is_in(
        Expr::get(filter.key.as_str()),
        filter.values.iter().map(|v| json!(v)).collect(),
    ))
}

/// Geometry guard keeping a sub-layer from rendering the wrong geometry kind
/// out of a mixed tile source.
pub fn geometry_guard(annotation: AnnotationType) -> Option<Expr> {
    match annotation {
        AnnotationType::Fill | AnnotationType::FillExtrusion => Some(Expr::eq(
            Expr::GeometryType,
            Expr::lit("Polygon"),
        )),
        AnnotationType::Circle => Some(Expr::eq(Expr::GeometryType, Expr::lit("Point"))),
        _ => None,
    }
}

/// Filter assignment for one sub-layer after aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterUpdate {
    Apply(Expr),
    /// Explicitly detach any previously applied filter. Required because
    /// disabling a filter does not clear what it already attached.
    Clear,
}

/// Aggregates a layer's enabled filters, geometry guards, and any applicable
/// color-exclusion filter into one composed filter per annotation sub-type.
///
/// Composed filters only attach to sub-types whose display config is
/// explicitly enabled. Sub-types touched only by disabled filters get an
/// explicit [`FilterUpdate::Clear`].
pub fn composed_filters(
    style: &VectorStyle,
    color_filter: Option<&ColorFilter>,
) -> BTreeMap<AnnotationType, FilterUpdate> {
    let mut updates = BTreeMap::new();

    if style.filters.is_empty() && color_filter.is_none() {
        // Nothing configured: reset every sub-layer to its geometry guard.
        for annotation in AnnotationType::ALL {
            if annotation == AnnotationType::Heatmap {
                continue;
            }
            let guard = if annotation == AnnotationType::Circle && style.draw_points() {
                None
            } else {
                geometry_guard(annotation)
            };
            updates.insert(
                annotation,
                match guard {
                    Some(expr) => FilterUpdate::Apply(expr),
                    None => FilterUpdate::Clear,
                },
            );
        }
        return updates;
    }

    let mut per_type: BTreeMap<AnnotationType, Vec<Expr>> = BTreeMap::new();
    for filter in &style.filters {
        if filter.enabled {
            let expr = compile_filter(filter);
            for annotation in &filter.layers {
                per_type.entry(*annotation).or_default().push(expr.clone());
            }
        } else {
            for annotation in &filter.layers {
                updates.insert(*annotation, FilterUpdate::Clear);
            }
        }
    }

    if let Some(color_filter) = color_filter {
        let expr = compile_color_filter(color_filter);
        match color_filter.scope {
            AnnotationScope::All => {
                for annotation in AnnotationType::ALL {
                    per_type.entry(annotation).or_default().push(expr.clone());
                }
            }
            AnnotationScope::One(annotation) => {
                per_type.entry(annotation).or_default().push(expr);
            }
        }
    }

    for annotation in AnnotationType::ALL {
        let Some(config) = style.display_config(annotation) else {
            continue;
        };
        if !config.filters_apply() {
            continue;
        }
        let type_filters = per_type.remove(&annotation).unwrap_or_default();
        if type_filters.is_empty() && !config.draw_points {
            continue;
        }
        let mut parts = Vec::new();
        if let Some(guard) = geometry_guard(annotation) {
            parts.push(guard);
        }
        parts.extend(type_filters);
        let update = match parts.len() {
            0 => continue,
            1 => FilterUpdate::Apply(parts.remove(0)),
            _ => FilterUpdate::Apply(Expr::All(parts)),
        };
        updates.insert(annotation, update);
    }

    updates
}
