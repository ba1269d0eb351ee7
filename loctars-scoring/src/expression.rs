//! Boolean requirement expressions.
//!
//! The grammar is deliberately small:
//!
//! ```text
//! expr    := and ("or" and)*
//! and     := not ("and" not)*
//! not     := "not" not | atom
//! atom    := IDENT | "(" expr ")"
//! ```
//!
//! Identifiers are parameter keys and may contain dots (`cdna_length.min`).
//! Expressions are compiled once when the configuration is loaded and then
//! evaluated against a per-transcript lookup of parameter outcomes.

use std::collections::BTreeSet;
use std::fmt::{self, Display};

use crate::errors::{ConfigError, ConfigResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

fn tokenize(text: &str) -> ConfigResult<Vec<(usize, Token)>> {
    let mut tokens = Vec::new();
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut i = 0;
    while i < chars.len() {
        let (position, c) = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '(' {
            tokens.push((position, Token::LParen));
            i += 1;
        } else if c == ')' {
            tokens.push((position, Token::RParen));
            i += 1;
        } else if c.is_ascii_alphabetic() || c == '_' {
            let mut word = String::new();
            while i < chars.len() {
                let c = chars[i].1;
                if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                    word.push(c);
                    i += 1;
                } else {
                    break;
                }
            }
            let token = match word.as_str() {
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                _ => Token::Ident(word),
            };
            tokens.push((position, token));
        } else {
            return Err(ConfigError::Expression {
                position,
                message: format!("unexpected character `{}`", c),
            });
        }
    }
    Ok(tokens)
}

///
/// Compiled requirement expression.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Param(String),
    Not(Box<Expression>),
    And(Vec<Expression>),
    Or(Vec<Expression>),
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    cursor: usize,
    length: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|(_, t)| t)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.cursor)
            .map(|(p, _)| *p)
            .unwrap_or(self.length)
    }

    fn error(&self, message: &str) -> ConfigError {
        ConfigError::Expression {
            position: self.position(),
            message: message.to_string(),
        }
    }

    fn expression(&mut self) -> ConfigResult<Expression> {
        let mut terms = vec![self.conjunction()?];
        while self.peek() == Some(&Token::Or) {
            self.cursor += 1;
            terms.push(self.conjunction()?);
        }
        Ok(match terms.len() {
            1 => terms.remove(0),
            _ => Expression::Or(terms),
        })
    }

    fn conjunction(&mut self) -> ConfigResult<Expression> {
        let mut terms = vec![self.negation()?];
        while self.peek() == Some(&Token::And) {
            self.cursor += 1;
            terms.push(self.negation()?);
        }
        Ok(match terms.len() {
            1 => terms.remove(0),
            _ => Expression::And(terms),
        })
    }

    fn negation(&mut self) -> ConfigResult<Expression> {
        if self.peek() == Some(&Token::Not) {
            self.cursor += 1;
            return Ok(Expression::Not(Box::new(self.negation()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> ConfigResult<Expression> {
        match self.peek().cloned() {
            Some(Token::Ident(name)) => {
                self.cursor += 1;
                Ok(Expression::Param(name))
            }
            Some(Token::LParen) => {
                self.cursor += 1;
                let inner = self.expression()?;
                if self.peek() != Some(&Token::RParen) {
                    return Err(self.error("expected `)`"));
                }
                self.cursor += 1;
                Ok(inner)
            }
            Some(_) => Err(self.error("expected a parameter name or `(`")),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

impl Expression {
    ///
    /// Parse an expression and check that every identifier is one of `declared`.
    ///
    pub fn compile(text: &str, declared: &BTreeSet<String>) -> ConfigResult<Self> {
        let mut parser = Parser {
            tokens: tokenize(text)?,
            cursor: 0,
            length: text.len(),
        };
        let expression = parser.expression()?;
        if parser.cursor != parser.tokens.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        for name in expression.parameters() {
            if !declared.contains(name) {
                return Err(ConfigError::UndeclaredParameter(name.to_string()));
            }
        }
        Ok(expression)
    }

    /// Conjunction of all parameters, used when no expression is given.
    pub fn all_of<'a>(names: impl IntoIterator<Item = &'a String>) -> Self {
        let mut terms: Vec<Expression> = names
            .into_iter()
            .map(|n| Expression::Param(n.clone()))
            .collect();
        match terms.len() {
            1 => terms.remove(0),
            _ => Expression::And(terms),
        }
    }

    /// Names referenced by the expression.
    pub fn parameters(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_parameters(&mut names);
        names
    }

    fn collect_parameters<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Expression::Param(name) => {
                names.insert(name.as_str());
            }
            Expression::Not(inner) => inner.collect_parameters(names),
            Expression::And(terms) | Expression::Or(terms) => {
                for term in terms {
                    term.collect_parameters(names);
                }
            }
        }
    }

    pub fn evaluate<F: Fn(&str) -> bool>(&self, outcome: &F) -> bool {
        match self {
            Expression::Param(name) => outcome(name),
            Expression::Not(inner) => !inner.evaluate(outcome),
            Expression::And(terms) => terms.iter().all(|t| t.evaluate(outcome)),
            Expression::Or(terms) => terms.iter().any(|t| t.evaluate(outcome)),
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Param(name) => write!(f, "{}", name),
            Expression::Not(inner) => write!(f, "not {}", inner),
            Expression::And(terms) | Expression::Or(terms) => {
                let joiner = if matches!(self, Expression::And(_)) {
                    " and "
                } else {
                    " or "
                };
                let parts: Vec<String> = terms.iter().map(|t| format!("({})", t)).collect();
                write!(f, "{}", parts.join(joiner))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn declared() -> BTreeSet<String> {
        ["cdna_length", "exon_num.multi", "exon_num.mono", "is_complete"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[rstest]
    fn test_precedence(declared: BTreeSet<String>) {
        let e = Expression::compile("cdna_length and exon_num.multi or is_complete", &declared)
            .unwrap();
        assert_eq!(
            e,
            Expression::Or(vec![
                Expression::And(vec![
                    Expression::Param("cdna_length".to_string()),
                    Expression::Param("exon_num.multi".to_string()),
                ]),
                Expression::Param("is_complete".to_string()),
            ])
        );
    }

    #[rstest]
    #[case("cdna_length and (exon_num.multi or exon_num.mono)", &["cdna_length", "exon_num.mono"], true)]
    #[case("cdna_length and (exon_num.multi or exon_num.mono)", &["exon_num.mono"], false)]
    #[case("not is_complete", &[], true)]
    #[case("not (cdna_length or is_complete)", &["is_complete"], false)]
    #[case("not not cdna_length", &["cdna_length"], true)]
    fn test_evaluate(
        declared: BTreeSet<String>,
        #[case] text: &str,
        #[case] passing: &[&str],
        #[case] expected: bool,
    ) {
        let e = Expression::compile(text, &declared).unwrap();
        assert_eq!(e.evaluate(&|name: &str| passing.contains(&name)), expected);
    }

    #[rstest]
    #[case("cdna_length and")]
    #[case("(cdna_length")]
    #[case("cdna_length is_complete")]
    #[case("cdna_length > 3")]
    #[case("")]
    fn test_syntax_errors(declared: BTreeSet<String>, #[case] text: &str) {
        assert!(matches!(
            Expression::compile(text, &declared),
            Err(ConfigError::Expression { .. })
        ));
    }

    #[rstest]
    fn test_undeclared_parameter(declared: BTreeSet<String>) {
        assert!(matches!(
            Expression::compile("cdna_length and exon_num", &declared),
            Err(ConfigError::UndeclaredParameter(name)) if name == "exon_num"
        ));
    }

    #[rstest]
    fn test_all_of(declared: BTreeSet<String>) {
        let e = Expression::all_of(declared.iter());
        assert_eq!(e.parameters().len(), 4);
        assert!(e.evaluate(&|_: &str| true));
        assert!(!e.evaluate(&|name: &str| name != "is_complete"));
    }
}
