//! Elasticsearch Translator
//!
//! Translates the [`Clause`] AST and compiled requests into Elasticsearch
//! query DSL JSON.
//!
//! # Query DSL shapes
//!
//! ```text
//! {"match_all": {}}
//! {"term": {"field": {"value": v, "case_insensitive": true}}}
//! {"range": {"field": {"gte": 0}}}
//! {"multi_match": {"query": q, "fields": [...], "type": "phrase", ...}}
//! {"match_phrase_prefix": {"field": {"query": q, "boost": 20}}}
//! {"bool": {"must": [...], "must_not": [...], "should": [...], "filter": [...]}}
//! ```

use serde_json::{json, Map, Value};

use super::query_builder::{BoolClause, Clause, Fuzziness, MultiMatch, MultiMatchKind, RangeQuery, TermValue};
use super::types::{CompiledMultiQuery, CompiledQuery, HighlightSpec, SortKey};

/// Analyzer configured on every `.exact` sub-field
pub const EXACT_ANALYZER: &str = "fm_exact_analyzer";

/// Mirrors the index setting `index.highlight.max_analyzed_offset`
const MAX_ANALYZED_OFFSET: u64 = 1_000_000;

/// Elasticsearch query translator
pub struct ElasticTranslator;

impl ElasticTranslator {
    /// Translate a clause to query DSL JSON
    pub fn translate(clause: &Clause) -> Value {
        match clause {
            Clause::MatchAll => json!({"match_all": {}}),
            Clause::Term {
                field,
                value,
                case_insensitive,
            } => {
                if *case_insensitive {
                    json!({"term": {field: {"value": Self::term_value(value), "case_insensitive": true}}})
                } else {
                    json!({"term": {field: Self::term_value(value)}})
                }
            }
            Clause::Exists { field } => json!({"exists": {"field": field}}),
            Clause::Range(range) => Self::translate_range(range),
            Clause::Prefix { field, value } => json!({"prefix": {field: {"value": value}}}),
            Clause::MultiMatch(multi) => Self::translate_multi_match(multi),
            Clause::MatchPhrasePrefix { field, query, boost } => {
                let mut body = Map::new();
                body.insert("query".into(), json!(query));
                if let Some(boost) = boost {
                    body.insert("boost".into(), json!(boost));
                }
                json!({"match_phrase_prefix": {field: body}})
            }
            Clause::ExactMatch { field, query } => json!({
                "match": {
                    field: {
                        "query": query,
                        "analyzer": EXACT_ANALYZER,
                        "operator": "AND",
                        "fuzziness": 0,
                    }
                }
            }),
            Clause::Bool(b) => Self::translate_bool(b),
        }
    }

    fn term_value(value: &TermValue) -> Value {
        match value {
            TermValue::Bool(b) => json!(b),
            TermValue::Integer(i) => json!(i),
            TermValue::Float(f) => json!(f),
            TermValue::Text(s) => json!(s),
        }
    }

    fn translate_range(range: &RangeQuery) -> Value {
        let mut bounds = Map::new();
        for (name, bound) in [("gt", range.gt), ("gte", range.gte), ("lt", range.lt), ("lte", range.lte)] {
            if let Some(v) = bound {
                bounds.insert(name.into(), json!(v));
            }
        }
        json!({"range": {range.field.clone(): bounds}})
    }

    fn translate_multi_match(multi: &MultiMatch) -> Value {
        let mut body = Map::new();
        body.insert("query".into(), json!(multi.query));
        body.insert("fields".into(), json!(multi.fields));
        if multi.kind == MultiMatchKind::Phrase {
            body.insert("type".into(), json!("phrase"));
        }
        if let Some(fuzziness) = multi.fuzziness {
            body.insert("fuzziness".into(), Self::fuzziness(fuzziness));
        }
        if let Some(max) = multi.max_expansions {
            body.insert("max_expansions".into(), json!(max));
        }
        if let Some(len) = multi.prefix_length {
            body.insert("prefix_length".into(), json!(len));
        }
        if let Some(msm) = &multi.minimum_should_match {
            body.insert("minimum_should_match".into(), json!(msm));
        }
        if multi.operator_or {
            body.insert("operator".into(), json!("or"));
        }
        if let Some(slop) = multi.slop {
            body.insert("slop".into(), json!(slop));
        }
        if let Some(boost) = multi.boost {
            body.insert("boost".into(), json!(boost));
        }
        json!({"multi_match": body})
    }

    fn fuzziness(fuzziness: Fuzziness) -> Value {
        match fuzziness {
            Fuzziness::Auto => json!("AUTO"),
            Fuzziness::Edits(n) => json!(n),
        }
    }

    fn translate_bool(b: &BoolClause) -> Value {
        let mut body = Map::new();
        for (name, clauses) in [
            ("must", &b.must),
            ("must_not", &b.must_not),
            ("should", &b.should),
            ("filter", &b.filter),
        ] {
            if !clauses.is_empty() {
                body.insert(name.into(), Value::Array(clauses.iter().map(Self::translate).collect()));
            }
        }
        json!({"bool": body})
    }

    fn translate_sort(sort: &[SortKey]) -> Value {
        Value::Array(
            sort.iter()
                .map(|key| match key {
                    SortKey::Score(order) => json!({"_score": {"order": order.as_str()}}),
                    SortKey::Field { field, order } => json!({field: {"order": order.as_str()}}),
                    SortKey::GeoDistance {
                        field,
                        coordinates,
                        order,
                    } => json!({"_geo_distance": {field: coordinates, "order": order.as_str()}}),
                })
                .collect(),
        )
    }

    fn translate_highlight(spec: &HighlightSpec) -> Value {
        let mut fields = Map::new();
        for field in &spec.fields {
            let mut config = Map::new();
            config.insert("type".into(), json!("plain"));
            config.insert("pre_tags".into(), json!([spec.pre_tag]));
            config.insert("post_tags".into(), json!([spec.post_tag]));
            config.insert("max_analyzed_offset".into(), json!(MAX_ANALYZED_OFFSET));
            if let Some(query) = &field.query {
                config.insert("highlight_query".into(), Self::translate(query));
            }
            fields.insert(field.name.clone(), Value::Object(config));
        }
        json!({
            "fields": fields,
            "number_of_fragments": 1,
            "fragment_size": spec.fragment_size,
            "no_match_size": spec.no_match_size,
        })
    }

    /// Full `_search` body for a single-collection request
    pub fn request_body(compiled: &CompiledQuery) -> Value {
        let inner = Clause::Bool(BoolClause {
            must: vec![compiled.query.clone()],
            filter: compiled.filters.clone(),
            ..BoolClause::default()
        });
        let mut body = json!({
            "from": compiled.from,
            "size": compiled.size,
            "track_scores": true,
            "track_total_hits": true,
            "query": {
                "script_score": {
                    "query": Self::translate(&inner),
                    "script": {"source": compiled.script.to_painless()},
                }
            },
            "sort": Self::translate_sort(&compiled.sort),
            "_source": {"excludes": compiled.source_excludes},
        });
        if let (Some(spec), Some(obj)) = (&compiled.highlight, body.as_object_mut()) {
            obj.insert("highlight".into(), Self::translate_highlight(spec));
        }
        body
    }

    /// Full `_search` body for a multi-collection request
    pub fn multi_request_body(compiled: &CompiledMultiQuery) -> Value {
        json!({
            "from": compiled.from,
            "size": compiled.size,
            "track_total_hits": true,
            "query": Self::translate(&compiled.query),
            "_source": {"excludes": compiled.source_excludes},
        })
    }
}
