// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Ranking script compiler
//!
//! Compiles a collection's declarative [`Ranking`] list into a [`ScoreExpr`]
//! that multiplies the backend's text relevance (`_score`).
//!
//! # Term shapes
//!
//! ```text
//! numeric : saturation(max(min, v), pivot)             v / (v + pivot)
//! date    : 1 - decayDateLinear(origin, Nd, 0, 0.5, v)  0 at origin, 0.5 at now
//! bool    : v == true ? 0.75 : 0.25
//!
//! weighted: term * weight
//! guarded : doc[field] missing ? 0 : term
//! asc     : 1 - guarded
//! ```
//!
//! A document missing a ranked field contributes a factor of 0, which zeroes
//! its whole score.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(test)]
use serde_json::{Map, Value};

use super::types::{CompileOptions, SortOrder};

const MS_PER_DAY: i64 = 1000 * 60 * 60 * 24;

/// How a ranked field is turned into a factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Scoring {
    Numeric {
        pivot: u64,
        #[serde(default = "default_numeric_min")]
        min: f64,
    },
    Date,
    Bool,
}

fn default_numeric_min() -> f64 {
    1.0
}

/// One ranking rule of a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub field: String,
    pub order: SortOrder,
    #[serde(default)]
    pub weight: Option<f64>,
    pub scoring: Scoring,
}

impl Ranking {
    /// Numeric saturation ranking, descending, weight 1
    pub fn numeric(field: impl Into<String>, pivot: u64) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
            weight: None,
            scoring: Scoring::Numeric {
                pivot,
                min: default_numeric_min(),
            },
        }
    }

    /// Linear date decay ranking, descending, weight 1
    pub fn date(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
            weight: None,
            scoring: Scoring::Date,
        }
    }

    /// Boolean ranking, descending, weight 1
    pub fn boolean(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
            weight: None,
            scoring: Scoring::Bool,
        }
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn ascending(mut self) -> Self {
        self.order = SortOrder::Asc;
        self
    }
}

/// Scoring expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreExpr {
    /// Backend text relevance
    BaseScore,
    Saturation { field: String, min: f64, pivot: u64 },
    DateDecay { field: String, origin: DateTime<Utc>, day_range: i64 },
    BoolFlag { field: String },
    Weighted { expr: Box<ScoreExpr>, weight: f64 },
    /// 0 when the field is missing, otherwise the inner expression
    Guarded { field: String, expr: Box<ScoreExpr> },
    /// `1 - expr`
    Invert(Box<ScoreExpr>),
    Product(Vec<ScoreExpr>),
}

impl ScoreExpr {
    /// Render as a Painless script source.
    pub fn to_painless(&self) -> String {
        match self {
            Self::BaseScore => "_score".to_string(),
            Self::Saturation { field, min, pivot } => format!(
                "saturation(Math.max({}, doc['{}'].value), {}L)",
                fmt_number(*min),
                field,
                pivot
            ),
            Self::DateDecay {
                field,
                origin,
                day_range,
            } => format!(
                "1 - decayDateLinear('{}', '{}d', '0', 0.5, doc['{}'].value)",
                origin.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                day_range,
                field
            ),
            Self::BoolFlag { field } => format!("doc['{}'].value == true ? 0.75 : 0.25", field),
            Self::Weighted { expr, weight } => {
                format!("(({}) * {})", expr.to_painless(), fmt_number(*weight))
            }
            Self::Guarded { field, expr } => format!(
                "(doc['{}'].size() == 0 ? 0 : ({}))",
                field,
                expr.to_painless()
            ),
            Self::Invert(expr) => format!("(1 - {})", expr.to_painless()),
            Self::Product(exprs) => exprs
                .iter()
                .map(ScoreExpr::to_painless)
                .collect::<Vec<_>>()
                .join(" * "),
        }
    }
}

#[cfg(test)]
impl ScoreExpr {
    /// Evaluate against a document source, mirroring the script's semantics.
    pub(crate) fn evaluate(&self, base_score: f64, doc: &Map<String, Value>) -> f64 {
        match self {
            Self::BaseScore => base_score,
            Self::Saturation { field, min, pivot } => {
                let value = doc.get(field).and_then(Value::as_f64).unwrap_or(*min).max(*min);
                value / (value + *pivot as f64)
            }
            Self::DateDecay {
                field,
                origin,
                day_range,
            } => {
                let Some(value_ms) = doc.get(field).and_then(date_millis) else {
                    return 0.0;
                };
                // decay 0.5 at `scale` => zero point at twice the scale
                let span = (2 * day_range * MS_PER_DAY) as f64;
                let distance = (value_ms - origin.timestamp_millis()).abs() as f64;
                let decay = ((span - distance) / span).max(0.0);
                1.0 - decay
            }
            Self::BoolFlag { field } => {
                if doc.get(field).and_then(Value::as_bool) == Some(true) {
                    0.75
                } else {
                    0.25
                }
            }
            Self::Weighted { expr, weight } => expr.evaluate(base_score, doc) * weight,
            Self::Guarded { field, expr } => {
                if field_is_missing(doc, field) {
                    0.0
                } else {
                    expr.evaluate(base_score, doc)
                }
            }
            Self::Invert(expr) => 1.0 - expr.evaluate(base_score, doc),
            Self::Product(exprs) => exprs.iter().map(|e| e.evaluate(base_score, doc)).product(),
        }
    }
}

#[cfg(test)]
fn field_is_missing(doc: &Map<String, Value>, field: &str) -> bool {
    match doc.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::Array(values)) => values.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
fn date_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => DateTime::parse_from_rfc3339(s).ok().map(|d| d.timestamp_millis()),
        _ => None,
    }
}

/// Integers render without a fractional part.
fn fmt_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Days from `origin` to `now`, rounded up.
pub fn day_range(origin: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let delta = (now - origin).num_milliseconds();
    (delta + MS_PER_DAY - 1).div_euclid(MS_PER_DAY)
}

/// Compile one ranking rule into a guarded, weighted, optionally inverted term.
pub fn compile_ranking(ranking: &Ranking, opts: &CompileOptions) -> ScoreExpr {
    let field = ranking.field.clone();
    let mut expr = match ranking.scoring {
        Scoring::Numeric { pivot, min } => ScoreExpr::Saturation {
            field: field.clone(),
            min,
            pivot,
        },
        Scoring::Date => ScoreExpr::DateDecay {
            field: field.clone(),
            origin: opts.origin,
            day_range: day_range(opts.origin, opts.now),
        },
        Scoring::Bool => ScoreExpr::BoolFlag { field: field.clone() },
    };
    if let Some(weight) = ranking.weight {
        expr = ScoreExpr::Weighted {
            expr: Box::new(expr),
            weight,
        };
    }
    let guarded = ScoreExpr::Guarded {
        field,
        expr: Box::new(expr),
    };
    match ranking.order {
        SortOrder::Asc => ScoreExpr::Invert(Box::new(guarded)),
        SortOrder::Desc => guarded,
    }
}

/// `_score` times every compiled ranking term; `_score` alone when there are none.
pub fn compile_score(rankings: &[Ranking], opts: &CompileOptions) -> ScoreExpr {
    if rankings.is_empty() {
        return ScoreExpr::BaseScore;
    }
    let mut factors = Vec::with_capacity(rankings.len() + 1);
    factors.push(ScoreExpr::BaseScore);
    factors.extend(rankings.iter().map(|r| compile_ranking(r, opts)));
    ScoreExpr::Product(factors)
}
