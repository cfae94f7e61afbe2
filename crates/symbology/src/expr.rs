use serde_json::{Value, json};

/// Typed style expression tree.
///
/// Serialized to the render surface's nested-array form by [`Expr::to_json`].
/// Building trees through this enum instead of raw JSON keeps operator arity
/// and nesting honest at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal scalar (string, number, bool).
    Lit(Value),
    /// Feature attribute lookup.
    Get(String),
    /// Attribute presence test.
    Has(String),
    GeometryType,
    Zoom,
    HeatmapDensity,
    Var(String),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    All(Vec<Expr>),
    Any(Vec<Expr>),
    Not(Box<Expr>),
    /// Membership in a literal value list.
    In {
        value: Box<Expr>,
        set: Vec<Value>,
    },
    /// `match` with literal arm labels. A label may itself be a list, which
    /// the surface treats as "any of these values".
    Match {
        input: Box<Expr>,
        arms: Vec<(Value, Expr)>,
        fallback: Box<Expr>,
    },
    Case {
        branches: Vec<(Expr, Expr)>,
        fallback: Option<Box<Expr>>,
    },
    /// Linear interpolation over `input`, stops sorted ascending by the
    /// builder functions.
    Interpolate {
        input: Box<Expr>,
        stops: Vec<(f64, Expr)>,
    },
    /// Substring `[start, end)` of a string-valued expression.
    Slice {
        input: Box<Expr>,
        start: i64,
        end: i64,
    },
    ToColor(Box<Expr>),
    /// Name binding scoped to `body`.
    Let {
        name: String,
        value: Box<Expr>,
        body: Box<Expr>,
    },
    /// Arithmetic product.
    Mul(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
        }
    }
}

impl Expr {
    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Lit(value.into())
    }

    pub fn get(attribute: impl Into<String>) -> Self {
        Expr::Get(attribute.into())
    }

    pub fn has(attribute: impl Into<String>) -> Self {
        Expr::Has(attribute.into())
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Expr::Compare(CompareOp::Eq, Box::new(lhs), Box::new(rhs))
    }

    pub fn compare(op: CompareOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Compare(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn is_in(value: Expr, set: Vec<Value>) -> Self {
        Expr::In {
            value: Box::new(value),
            set,
        }
    }

    pub fn not(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    /// Serializes to the surface's nested-array wire form.
    pub fn to_json(&self) -> Value {
        match self {
            Expr::Lit(value) => value.clone(),
            Expr::Get(attr) => json!(["get", attr]),
            Expr::Has(attr) => json!(["has", attr]),
            Expr::GeometryType => json!(["geometry-type"]),
            Expr::Zoom => json!(["zoom"]),
            Expr::HeatmapDensity => json!(["heatmap-density"]),
            Expr::Var(name) => json!(["var", name]),
            Expr::Compare(op, lhs, rhs) => {
                json!([op.as_str(), lhs.to_json(), rhs.to_json()])
            }
            Expr::All(exprs) => {
                let mut out = vec![json!("all")];
                out.extend(exprs.iter().map(Expr::to_json));
                Value::Array(out)
            }
            Expr::Any(exprs) => {
                let mut out = vec![json!("any")];
                out.extend(exprs.iter().map(Expr::to_json));
                Value::Array(out)
            }
            Expr::Not(inner) => json!(["!", inner.to_json()]),
            Expr::In { value, set } => {
                json!(["in", value.to_json(), ["literal", set]])
            }
            Expr::Match {
                input,
                arms,
                fallback,
            } => {
                let mut out = vec![json!("match"), input.to_json()];
                for (label, output) in arms {
                    out.push(label.clone());
                    out.push(output.to_json());
                }
                out.push(fallback.to_json());
                Value::Array(out)
            }
            Expr::Case { branches, fallback } => {
                let mut out = vec![json!("case")];
                for (condition, output) in branches {
                    out.push(condition.to_json());
                    out.push(output.to_json());
                }
                if let Some(fallback) = fallback {
                    out.push(fallback.to_json());
                }
                Value::Array(out)
            }
            Expr::Interpolate { input, stops } => {
                let mut out = vec![json!("interpolate"), json!(["linear"]), input.to_json()];
                for (value, output) in stops {
                    out.push(json!(value));
                    out.push(output.to_json());
                }
                Value::Array(out)
            }
            Expr::Slice { input, start, end } => {
                json!(["slice", input.to_json(), start, end])
            }
            Expr::ToColor(inner) => json!(["to-color", inner.to_json()]),
            Expr::Let { name, value, body } => {
                json!(["let", name, value.to_json(), body.to_json()])
            }
            Expr::Mul(lhs, rhs) => json!(["*", lhs.to_json(), rhs.to_json()]),
        }
    }
}

/// Linear interpolation over `[input value, output]` stops, sorted ascending.
pub fn interpolate_stops(input: Expr, mut stops: Vec<(f64, Expr)>) -> Expr {
    stops.sort_by(|a, b| a.0.total_cmp(&b.0));
    Expr::Interpolate {
        input: Box::new(input),
        stops,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{CompareOp, Expr, interpolate_stops};

    #[test]
    fn serializes_nested_case() {
        let expr = Expr::Case {
            branches: vec![(
                Expr::compare(CompareOp::Le, Expr::get("pop"), Expr::lit(10.0)),
                Expr::lit("#ff0000"),
            )],
            fallback: Some(Box::new(Expr::lit("#888888"))),
        };
        assert_eq!(
            expr.to_json(),
            json!(["case", ["<=", ["get", "pop"], 10.0], "#ff0000", "#888888"])
        );
    }

    #[test]
    fn membership_wraps_set_in_literal() {
        let expr = Expr::is_in(Expr::get("id"), vec![json!(1), json!(2)]);
        assert_eq!(expr.to_json(), json!(["in", ["get", "id"], ["literal", [1, 2]]]));
    }

    #[test]
    fn interpolate_sorts_stops() {
        let expr = interpolate_stops(
            Expr::Zoom,
            vec![(14.0, Expr::lit(1.0)), (5.0, Expr::lit(10.0))],
        );
        assert_eq!(
            expr.to_json(),
            json!(["interpolate", ["linear"], ["zoom"], 5.0, 10.0, 14.0, 1.0])
        );
    }
}
