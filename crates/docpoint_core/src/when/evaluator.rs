//! When-clause evaluation boundary and the built-in context-key evaluator.
//!
//! # Responsibility
//! - Define the evaluator contract resolution depends on.
//! - Provide a small evaluator for hosts that do not bring their own.
//!
//! # Invariants
//! - Evaluation is synchronous and side-effect free.
//! - An empty expression is `true`.
//! - Malformed expressions return an error; callers decide how to degrade.
//! - Expression length and nesting are bounded, so extension-authored
//!   clauses cannot exhaust the stack.

use crate::when::context::WhenContext;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAX_EXPRESSION_CHARS: usize = 1024;
const MAX_NESTING_DEPTH: usize = 64;

static CONTEXT_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_.:$/-]*$").expect("valid context key regex")
});

/// Failure to evaluate one when clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateEvaluationError {
    pub expression: String,
    pub reason: String,
}

impl PredicateEvaluationError {
    pub fn new(expression: &str, reason: impl Into<String>) -> Self {
        Self {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}

impl Display for PredicateEvaluationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot evaluate when clause `{}`: {}",
            self.expression, self.reason
        )
    }
}

impl Error for PredicateEvaluationError {}

/// Boolean predicate evaluator over an opaque host context.
pub trait WhenEvaluator<C: ?Sized>: Send + Sync {
    fn evaluate(&self, expression: &str, context: &C) -> Result<bool, PredicateEvaluationError>;
}

impl<C, F> WhenEvaluator<C> for F
where
    C: ?Sized,
    F: Fn(&str, &C) -> Result<bool, PredicateEvaluationError> + Send + Sync,
{
    fn evaluate(&self, expression: &str, context: &C) -> Result<bool, PredicateEvaluationError> {
        self(expression, context)
    }
}

/// Evaluates context-key expressions against a [`WhenContext`].
///
/// Supports `true`, `false`, bare keys, `!`, `==`, `!=`, `&&`, `||` and
/// parentheses. Right-hand operands of comparisons are literals, quoted or
/// bare.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextKeyEvaluator;

impl WhenEvaluator<WhenContext> for ContextKeyEvaluator {
    fn evaluate(
        &self,
        expression: &str,
        context: &WhenContext,
    ) -> Result<bool, PredicateEvaluationError> {
        if expression.trim().is_empty() {
            return Ok(true);
        }
        if expression.chars().count() > MAX_EXPRESSION_CHARS {
            return Err(PredicateEvaluationError::new(
                expression,
                format!("expression longer than {MAX_EXPRESSION_CHARS} characters"),
            ));
        }
        let tokens = tokenize(expression)
            .map_err(|reason| PredicateEvaluationError::new(expression, reason))?;
        let mut parser = Parser {
            tokens: &tokens,
            position: 0,
            depth: 0,
        };
        let expr = parser
            .parse_or()
            .map_err(|reason| PredicateEvaluationError::new(expression, reason))?;
        if let Some(token) = parser.peek() {
            return Err(PredicateEvaluationError::new(
                expression,
                format!("unexpected token {token}"),
            ));
        }
        Ok(expr.eval(context))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Quoted(String),
    Not,
    Equals,
    NotEquals,
    And,
    Or,
    Open,
    Close,
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Word(word) => write!(f, "`{word}`"),
            Self::Quoted(text) => write!(f, "'{text}'"),
            Self::Not => f.write_str("`!`"),
            Self::Equals => f.write_str("`==`"),
            Self::NotEquals => f.write_str("`!=`"),
            Self::And => f.write_str("`&&`"),
            Self::Or => f.write_str("`||`"),
            Self::Open => f.write_str("`(`"),
            Self::Close => f.write_str("`)`"),
        }
    }
}

fn tokenize(expression: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            '!' if chars.peek() == Some(&'=') => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                }
                tokens.push(Token::NotEquals);
            }
            '!' => tokens.push(Token::Not),
            '=' => {
                if chars.next() != Some('=') {
                    return Err("expected `==`".to_string());
                }
                if chars.peek() == Some(&'=') {
                    chars.next();
                }
                tokens.push(Token::Equals);
            }
            '&' => {
                if chars.next() != Some('&') {
                    return Err("expected `&&`".to_string());
                }
                tokens.push(Token::And);
            }
            '|' => {
                if chars.next() != Some('|') {
                    return Err("expected `||`".to_string());
                }
                tokens.push(Token::Or);
            }
            '\'' | '"' => {
                let mut text = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == c {
                        closed = true;
                        break;
                    }
                    text.push(next);
                }
                if !closed {
                    return Err("unterminated string literal".to_string());
                }
                tokens.push(Token::Quoted(text));
            }
            _ => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || "()!=&|'\"".contains(next) {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }
    Ok(tokens)
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(bool),
    Key(String),
    Not(Box<Expr>),
    Equals {
        key: String,
        value: String,
        negated: bool,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn eval(&self, context: &WhenContext) -> bool {
        match self {
            Self::Literal(value) => *value,
            Self::Key(key) => context.is_truthy(key),
            Self::Not(inner) => !inner.eval(context),
            Self::Equals {
                key,
                value,
                negated,
            } => value_matches(context.get(key), value) != *negated,
            Self::And(left, right) => left.eval(context) && right.eval(context),
            Self::Or(left, right) => left.eval(context) || right.eval(context),
        }
    }
}

fn value_matches(actual: Option<&Value>, expected: &str) -> bool {
    match actual {
        None | Some(Value::Null) => false,
        Some(Value::String(value)) => value == expected,
        Some(Value::Bool(value)) => expected.parse::<bool>() == Ok(*value),
        Some(Value::Number(number)) => match (number.as_f64(), expected.parse::<f64>()) {
            (Some(actual), Ok(expected)) => actual == expected,
            _ => false,
        },
        Some(other) => other.to_string() == expected,
    }
}

struct Parser<'t> {
    tokens: &'t [Token],
    position: usize,
    depth: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn descend(&mut self) -> Result<(), String> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(format!(
                "expression nested too deeply (limit {MAX_NESTING_DEPTH})"
            ));
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            expr = Expr::Or(Box::new(expr), Box::new(self.parse_and()?));
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            expr = Expr::And(Box::new(expr), Box::new(self.parse_unary()?));
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            self.descend()?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Some(Token::Open) => {
                self.descend()?;
                let expr = self.parse_or()?;
                self.depth -= 1;
                match self.advance() {
                    Some(Token::Close) => Ok(expr),
                    Some(token) => Err(format!("expected `)`, found {token}")),
                    None => Err("expected `)`, found end of expression".to_string()),
                }
            }
            Some(Token::Word(word)) => self.parse_key_expression(word),
            Some(token) => Err(format!("unexpected token {token}")),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn parse_key_expression(&mut self, word: &str) -> Result<Expr, String> {
        let negated = match self.peek() {
            Some(Token::Equals) => false,
            Some(Token::NotEquals) => true,
            _ => {
                return match word {
                    "true" => Ok(Expr::Literal(true)),
                    "false" => Ok(Expr::Literal(false)),
                    key => Ok(Expr::Key(validate_key(key)?)),
                }
            }
        };
        self.advance();
        let key = validate_key(word)?;
        let value = match self.advance() {
            Some(Token::Word(value)) | Some(Token::Quoted(value)) => value.clone(),
            Some(token) => return Err(format!("expected comparison value, found {token}")),
            None => return Err("expected comparison value, found end of expression".to_string()),
        };
        Ok(Expr::Equals {
            key,
            value,
            negated,
        })
    }
}

fn validate_key(word: &str) -> Result<String, String> {
    if CONTEXT_KEY_RE.is_match(word) {
        Ok(word.to_string())
    } else {
        Err(format!("invalid context key `{word}`"))
    }
}
