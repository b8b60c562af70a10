//! Boolean Evaluator
//!
//! Evaluates a query expression tree against one record. The tree is compiled
//! once per query into a [`Plan`] whose leaves hold ready-to-run patterns, then
//! run against every candidate.
//!
//! Scoring is best-match-wins: a true `AND`/`OR` node carries the maximum score
//! of its true children. Highlights and matched fields accumulate from every
//! positive term that evaluated true, even under an `AND` that failed, so
//! `a AND b OR c` on a record holding `a` and `c` surfaces both fields. Both
//! sides of every node are evaluated. A `NOT` node contributes neither score
//! nor highlights.

use super::matcher::Pattern;
use super::parser::{Expr, Term};
use super::resolver::resolve_field;
use crate::record::{Record, Value};

/// Per-query evaluation settings
#[derive(Debug, Clone)]
pub struct EvalContext<'a> {
    /// Fields tried for terms without an explicit field
    pub searchable: &'a [String],
    pub highlight: bool,
    /// Characters of context around exact highlights
    pub context: usize,
}

/// One field that contributed to a match
#[derive(Debug, Clone, PartialEq)]
pub struct FieldHit {
    pub path: String,
    pub highlights: Vec<String>,
}

/// Result of evaluating a plan against one record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub matched: bool,
    pub score: f64,
    pub hits: Vec<FieldHit>,
}

impl Evaluation {
    fn miss() -> Self {
        Self::default()
    }
}

/// Compiled expression tree
#[derive(Debug, Clone)]
pub enum Plan {
    Term {
        field: Option<String>,
        pattern: Pattern,
    },
    Not(Box<Plan>),
    And(Box<Plan>, Box<Plan>),
    Or(Box<Plan>, Box<Plan>),
}

impl Plan {
    pub fn compile(expr: &Expr) -> Self {
        match expr {
            Expr::Term(Term {
                field,
                value,
                exact_phrase,
            }) => Plan::Term {
                field: field.clone(),
                pattern: Pattern::compile(value, *exact_phrase),
            },
            // Groups only exist to shape the tree
            Expr::Group(inner) => Plan::compile(inner),
            Expr::Not(inner) => Plan::Not(Box::new(Plan::compile(inner))),
            Expr::And(a, b) => Plan::And(Box::new(Plan::compile(a)), Box::new(Plan::compile(b))),
            Expr::Or(a, b) => Plan::Or(Box::new(Plan::compile(a)), Box::new(Plan::compile(b))),
        }
    }

    pub fn evaluate(&self, record: &Record, ctx: &EvalContext<'_>) -> Evaluation {
        self.run(Target::Record(record), ctx)
    }

    /// Evaluate against a single leaf value. Unscoped terms see only this
    /// leaf; `ctx.searchable` is ignored.
    pub fn evaluate_leaf(&self, path: &str, value: &Value, ctx: &EvalContext<'_>) -> Evaluation {
        self.run(Target::Leaf(path, value), ctx)
    }

    fn run(&self, target: Target<'_>, ctx: &EvalContext<'_>) -> Evaluation {
        match self {
            Plan::Term { field, pattern } => match field {
                Some(field) => evaluate_scoped(target, field, pattern, ctx),
                None => evaluate_unscoped(target, pattern, ctx),
            },
            Plan::Not(inner) => Evaluation {
                matched: !inner.run(target, ctx).matched,
                score: 0.0,
                hits: Vec::new(),
            },
            Plan::And(a, b) => {
                let left = a.run(target, ctx);
                let right = b.run(target, ctx);
                if left.matched && right.matched {
                    combine(left, right)
                } else {
                    // Keep the true side's hits for an enclosing OR
                    let mut hits = left.hits;
                    hits.extend(right.hits);
                    Evaluation {
                        matched: false,
                        score: 0.0,
                        hits,
                    }
                }
            }
            Plan::Or(a, b) => {
                let left = a.run(target, ctx);
                let right = b.run(target, ctx);
                let score = match (left.matched, right.matched) {
                    (true, true) => left.score.max(right.score),
                    (true, false) => left.score,
                    (false, true) => right.score,
                    (false, false) => 0.0,
                };
                let mut hits = left.hits;
                hits.extend(right.hits);
                Evaluation {
                    matched: left.matched || right.matched,
                    score,
                    hits,
                }
            }
        }
    }
}

/// What a plan runs against: a whole record, or one leaf of it
#[derive(Clone, Copy)]
enum Target<'a> {
    Record(&'a Record),
    Leaf(&'a str, &'a Value),
}

impl<'a> Target<'a> {
    /// Occurrences of `field`. A leaf answers to its full path or to its path
    /// below the top-level section.
    fn scoped(self, field: &str) -> Vec<(String, &'a Value)> {
        match self {
            Target::Record(record) => resolve_field(record, field),
            Target::Leaf(path, value) => {
                let below_section = path.split_once('.').map(|(_, rest)| rest);
                if path == field || below_section == Some(field) {
                    vec![(path.to_string(), value)]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Candidates for a bare term
    fn unscoped(self, searchable: &[String]) -> Vec<(String, &'a Value)> {
        match self {
            Target::Record(record) => searchable
                .iter()
                .flat_map(|field| resolve_field(record, field))
                .collect(),
            Target::Leaf(path, value) => vec![(path.to_string(), value)],
        }
    }
}

fn combine(mut left: Evaluation, right: Evaluation) -> Evaluation {
    left.score = left.score.max(right.score);
    left.hits.extend(right.hits);
    left
}

/// `field:value` term: every resolved occurrence is a candidate, the first
/// matching path is reported.
fn evaluate_scoped(target: Target<'_>, field: &str, pattern: &Pattern, ctx: &EvalContext<'_>) -> Evaluation {
    for (path, value) in target.scoped(field) {
        let outcome = pattern.match_value(value, ctx.highlight, ctx.context);
        if outcome.matched {
            return Evaluation {
                matched: true,
                score: outcome.score,
                hits: vec![FieldHit {
                    path,
                    highlights: outcome.highlights,
                }],
            };
        }
    }
    Evaluation::miss()
}

/// Bare term: tried against every searchable field, each match is a hit.
fn evaluate_unscoped(target: Target<'_>, pattern: &Pattern, ctx: &EvalContext<'_>) -> Evaluation {
    let mut eval = Evaluation::miss();
    for (path, value) in target.unscoped(ctx.searchable) {
        let outcome = pattern.match_value(value, ctx.highlight, ctx.context);
        if !outcome.matched {
            continue;
        }
        eval.matched = true;
        eval.score = eval.score.max(outcome.score);
        if !eval.hits.iter().any(|hit| hit.path == path) {
            eval.hits.push(FieldHit {
                path,
                highlights: outcome.highlights,
            });
        }
    }
    eval
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::parser::QueryParser;
    use serde_json::json;

    fn searchable() -> Vec<String> {
        ["core.name", "core.email", "tags.status", "tags.category"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn eval(query: &str, record: &Record) -> Evaluation {
        let parsed = QueryParser::parse(query);
        assert!(parsed.is_ok(), "parse failed for {:?}", query);
        let expr = QueryParser::build_expr(&parsed).expect("non-empty expression");
        let fields = searchable();
        let ctx = EvalContext {
            searchable: &fields,
            highlight: true,
            context: 50,
        };
        Plan::compile(&expr).evaluate(record, &ctx)
    }

    fn person(name: &str, status: &str, category: &str) -> Record {
        Record::new(
            "case-1",
            name,
            json!({
                "core": {"name": name},
                "tags": {"status": status, "category": category}
            }),
        )
    }

    #[test]
    fn test_exact_single_word_scores_one() {
        let record = person("alice", "active", "contact");
        let result = eval("ALICE", &record);
        assert!(result.matched);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_and_or_left_to_right() {
        // Only `c` holds: (a AND b) OR c must match
        let record = person("carol", "active", "contact");
        assert!(eval("alice AND bob OR carol", &record).matched);

        // a OR b AND c is (a OR b) AND c
        let record = person("carol", "active", "contact");
        assert!(!eval("alice OR bob AND carol", &record).matched);
    }

    #[test]
    fn test_not_excludes_archived() {
        let archived = person("dave", "archived", "contact");
        let active = person("erin", "active", "contact");

        assert!(!eval("NOT tags.status:archived", &archived).matched);
        assert!(eval("NOT tags.status:archived", &active).matched);
        // Bare field name resolves under the `tags` section
        assert!(!eval("NOT status:archived", &archived).matched);
        assert!(eval("NOT status:archived", &active).matched);
    }

    #[test]
    fn test_negated_match_scores_zero() {
        let record = person("erin", "active", "contact");
        let result = eval("NOT status:archived", &record);
        assert!(result.matched);
        assert_eq!(result.score, 0.0);
        assert!(result.hits.is_empty());
    }

    #[test]
    fn test_grouping() {
        let bc = person("bob", "active", "carol");
        assert!(eval("(alice OR bob) AND carol", &bc).matched);

        let ab = Record::new(
            "case-1",
            "ab",
            json!({"core": {"name": "alice", "email": "bob@example.com"}}),
        );
        assert!(!eval("(alice OR bob) AND carol", &ab).matched);
    }

    #[test]
    fn test_and_accumulates_hits_from_every_field() {
        let record = person("frank", "active", "suspect");
        let result = eval("frank AND status:active", &record);
        assert!(result.matched);
        let paths: Vec<&str> = result.hits.iter().map(|h| h.path.as_str()).collect();
        assert_eq!(paths, vec!["core.name", "tags.status"]);
        assert_eq!(result.hits[0].highlights, vec!["**frank**"]);
    }

    #[test]
    fn test_status_and_not_category() {
        let a = person("a", "active", "suspect");
        let b = person("b", "active", "contact");
        let query = "tags.status:active AND NOT tags.category:suspect";
        assert!(!eval(query, &a).matched);
        assert!(eval(query, &b).matched);
    }

    #[test]
    fn test_wildcard_email_field() {
        let record = Record::new(
            "case-1",
            "jd",
            json!({"core": {"name": "John Doe", "email": "john.doe@gmail.com"}}),
        );
        let result = eval("core.email:*@gmail.com", &record);
        assert!(result.matched);
        assert!(result.score > 0.0);
        assert_eq!(result.hits[0].path, "core.email");
        assert_eq!(result.hits[0].highlights, vec!["≈ john.doe@gmail.com"]);
    }

    #[test]
    fn test_field_phrase_requires_equality() {
        let record = Record::new(
            "case-1",
            "p",
            json!({"location": {"city": "New York City"}}),
        );
        assert!(!eval("location.city:\"new york\"", &record).matched);
        assert!(eval("location.city:york", &record).matched);
    }

    #[test]
    fn test_missing_field_is_no_match() {
        let record = person("gina", "active", "contact");
        assert!(!eval("core.phone:555", &record).matched);
        assert!(eval("NOT core.phone:555", &record).matched);
    }

    #[test]
    fn test_unscoped_term_ignores_non_searchable_fields() {
        let record = Record::new(
            "case-1",
            "h",
            json!({"core": {"name": "Hank"}, "internal": {"secret": "needle"}}),
        );
        assert!(!eval("needle", &record).matched);
        assert!(eval("internal.secret:needle", &record).matched);
    }

    #[test]
    fn test_failed_and_keeps_hits_for_enclosing_or() {
        let record = person("alice", "active", "contact");
        let result = eval("alice AND bob OR active", &record);
        assert!(result.matched);
        assert_eq!(result.score, 1.0);
        let paths: Vec<&str> = result.hits.iter().map(|h| h.path.as_str()).collect();
        assert_eq!(paths, vec!["core.name", "tags.status"]);
    }

    #[test]
    fn test_failed_and_is_still_a_miss() {
        let record = person("alice", "active", "contact");
        let result = eval("alice AND bob", &record);
        assert!(!result.matched);
        assert_eq!(result.score, 0.0);
        // The true side's hit is carried, the caller drops it on a miss
        assert_eq!(result.hits.len(), 1);
    }

    #[test]
    fn test_or_score_ignores_false_side() {
        let record = Record::new(
            "case-1",
            "s",
            json!({"core": {"name": "Ajohn"}, "tags": {"status": "johnson"}}),
        );
        // The failed AND would score 1.0 from `johnson`
        let result = eval("tags.status:johnson AND nobody OR core.name:john", &record);
        assert!(result.matched);
        assert_eq!(result.score, 0.7);
        assert_eq!(result.hits.len(), 2);
    }

    #[test]
    fn test_leaf_with_dotted_key() {
        let record = Record::new(
            "case-1",
            "m",
            json!({"contact": {"e.mail": "x@lopez.org"}}),
        );
        let parsed = QueryParser::parse("lopez");
        let expr = QueryParser::build_expr(&parsed).unwrap();
        let plan = Plan::compile(&expr);
        let ctx = EvalContext {
            searchable: &[],
            highlight: true,
            context: 50,
        };

        let leaves = record.leaf_values();
        let (path, value) = &leaves[0];
        let result = plan.evaluate_leaf(path, value, &ctx);
        assert!(result.matched);
        assert_eq!(result.hits[0].path, "contact.e.mail");
        assert_eq!(result.hits[0].highlights, vec!["x@**lopez**.org"]);

        // Bare field names resolve below the section
        for query in ["contact.e.mail:lopez", "e.mail:lopez"] {
            let expr = QueryParser::build_expr(&QueryParser::parse(query)).unwrap();
            assert!(Plan::compile(&expr).evaluate_leaf(path, value, &ctx).matched);
        }
    }
}
