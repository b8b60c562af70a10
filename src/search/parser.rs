//! Query Parser
//!
//! Turns a raw query string into a flat, order-preserving token list
//! ([`ParsedQuery`]) and then into a nested boolean expression tree ([`Expr`]).
//!
//! Recognised syntax:
//! - bare words and `"quoted phrases"`
//! - `field:value` and `field:"quoted value"`
//! - `AND` / `OR` operators (upper case only)
//! - `NOT` prefix, negating the single token that follows
//! - `(` and `)` grouping
//! - `*` / `?` wildcards inside any value
//!
//! There is no escape syntax: a literal `"`, `*` or `?` cannot be searched for.

use super::types::{ParsedQuery, QueryParseError, QueryToken, TokenKind};

/// A single matchable condition
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub field: Option<String>,
    pub value: String,
    /// Full-value equality instead of substring
    pub exact_phrase: bool,
}

/// Boolean expression tree built from the token list
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Term(Term),
    Group(Box<Expr>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    And,
    Or,
}

/// Query parser
pub struct QueryParser;

impl QueryParser {
    /// Tokenize a raw query. Never fails: problems are reported on `ParsedQuery::error`.
    pub fn parse(raw: &str) -> ParsedQuery {
        let mut parsed = ParsedQuery::default();

        if raw.trim().is_empty() {
            parsed.error = Some(QueryParseError::Empty);
            return parsed;
        }

        let chars: Vec<char> = raw.chars().collect();
        let mut i = 0;
        let mut negate_next = false;

        while i < chars.len() {
            let ch = chars[i];

            if ch.is_whitespace() {
                i += 1;
                continue;
            }

            if ch == '(' || ch == ')' {
                let mut token = QueryToken::group(ch.to_string());
                // A pending NOT applies to an opening group only
                if ch == '(' && negate_next {
                    token.negated = true;
                }
                negate_next = false;
                parsed.tokens.push(token);
                i += 1;
                continue;
            }

            if ch == '"' {
                match Self::read_quoted(&chars, i) {
                    Some((phrase, next)) => {
                        if phrase.is_empty() {
                            negate_next = false;
                        } else {
                            Self::push_term(&mut parsed, QueryToken::phrase(phrase), &mut negate_next);
                        }
                        i = next;
                    }
                    None => {
                        parsed.error = Some(QueryParseError::UnterminatedQuote { position: i });
                        break;
                    }
                }
                continue;
            }

            // Bare run up to whitespace, a paren or a quote
            let start = i;
            while i < chars.len() && !Self::is_boundary(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();

            // field:"quoted value"
            if let Some(field) = word.strip_suffix(':') {
                if i < chars.len() && chars[i] == '"' && Self::is_field_name(field) {
                    match Self::read_quoted(&chars, i) {
                        Some((value, next)) => {
                            if value.is_empty() {
                                negate_next = false;
                            } else {
                                let token = QueryToken::field(field, value).quoted();
                                Self::push_term(&mut parsed, token, &mut negate_next);
                            }
                            i = next;
                        }
                        None => {
                            parsed.error =
                                Some(QueryParseError::UnterminatedQuote { position: i });
                            break;
                        }
                    }
                    continue;
                }
            }

            match word.as_str() {
                "AND" | "OR" => {
                    negate_next = false;
                    parsed.tokens.push(QueryToken::operator(word.clone()));
                    continue;
                }
                "NOT" => {
                    negate_next = true;
                    continue;
                }
                _ => {}
            }

            let token = match Self::split_field(&word) {
                Some((field, value)) => QueryToken::field(field, value),
                None => QueryToken::word(word.clone()),
            };
            Self::push_term(&mut parsed, token, &mut negate_next);
        }

        parsed
    }

    /// Characters that end a bare word
    fn is_boundary(ch: char) -> bool {
        ch.is_whitespace() || ch == '(' || ch == ')' || ch == '"'
    }

    /// Read a `"..."` run starting at `open`. Returns the inner text and the
    /// index after the closing quote, or `None` when the quote never closes.
    fn read_quoted(chars: &[char], open: usize) -> Option<(String, usize)> {
        let close = chars[open + 1..].iter().position(|&c| c == '"')? + open + 1;
        let inner: String = chars[open + 1..close].iter().collect();
        Some((inner.trim().to_string(), close + 1))
    }

    fn push_term(parsed: &mut ParsedQuery, mut token: QueryToken, negate_next: &mut bool) {
        if *negate_next {
            token.negated = true;
            *negate_next = false;
        }

        if token.has_wildcards {
            parsed.has_wildcards = true;
        }

        if let Some(field) = &token.field {
            parsed
                .field_conditions
                .entry(field.clone())
                .or_default()
                .push(token.value.clone());
        }

        parsed.tokens.push(token);
    }

    /// Split `field:value`. The field must look like a dotted identifier and the
    /// value must be non-empty; `scheme://...` is left as a plain word.
    fn split_field(word: &str) -> Option<(&str, &str)> {
        let (field, value) = word.split_once(':')?;
        if value.is_empty() || value.starts_with("//") || !Self::is_field_name(field) {
            return None;
        }
        Some((field, value))
    }

    fn is_field_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_alphabetic() || first == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '-')
    }

    /// Build the expression tree for a parsed query.
    ///
    /// `AND` and `OR` share one precedence level and fold left to right, so
    /// `a AND b OR c` is `(a AND b) OR c`. Adjacent terms without an operator
    /// are joined with `AND`. Unbalanced parentheses never fail: a stray `)` is
    /// skipped and an unclosed `(` runs to the end of the input.
    pub fn build_expr(parsed: &ParsedQuery) -> Option<Expr> {
        let mut builder = ExprBuilder {
            tokens: &parsed.tokens,
            pos: 0,
        };
        builder.sequence(0)
    }

    /// Simple mode: whitespace-separated terms, all required.
    pub fn free_text_expr(text: &str) -> Option<Expr> {
        text.split_whitespace()
            .map(|word| {
                Expr::Term(Term {
                    field: None,
                    value: word.to_string(),
                    exact_phrase: false,
                })
            })
            .reduce(|acc, term| Expr::And(Box::new(acc), Box::new(term)))
    }
}

struct ExprBuilder<'a> {
    tokens: &'a [QueryToken],
    pos: usize,
}

impl ExprBuilder<'_> {
    fn sequence(&mut self, depth: usize) -> Option<Expr> {
        let mut acc: Option<Expr> = None;
        let mut pending: Option<Op> = None;

        while self.pos < self.tokens.len() {
            let token = &self.tokens[self.pos];
            self.pos += 1;

            let node = match token.kind {
                TokenKind::Operator => {
                    pending = Some(if token.value == "OR" { Op::Or } else { Op::And });
                    continue;
                }
                TokenKind::Group if token.value == ")" => {
                    if depth > 0 {
                        return acc;
                    }
                    continue;
                }
                TokenKind::Group => {
                    let negated = token.negated;
                    self.sequence(depth + 1).map(|inner| {
                        let group = Expr::Group(Box::new(inner));
                        if negated {
                            Expr::Not(Box::new(group))
                        } else {
                            group
                        }
                    })
                }
                _ => {
                    let term = Expr::Term(Term {
                        field: token.field.clone(),
                        value: token.value.clone(),
                        exact_phrase: token.quoted,
                    });
                    Some(if token.negated {
                        Expr::Not(Box::new(term))
                    } else {
                        term
                    })
                }
            };

            acc = fold(acc, pending.take(), node);
        }

        acc
    }
}

fn fold(acc: Option<Expr>, op: Option<Op>, node: Option<Expr>) -> Option<Expr> {
    match (acc, node) {
        (None, node) => node,
        (acc, None) => acc,
        (Some(left), Some(right)) => Some(match op.unwrap_or(Op::And) {
            Op::And => Expr::And(Box::new(left), Box::new(right)),
            Op::Or => Expr::Or(Box::new(left), Box::new(right)),
        }),
    }
}
