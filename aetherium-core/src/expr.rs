//! Default expression evaluator.
//!
//! A small statement language over the bindings of a state:
//!
//! - `name = expr` - assignment to an existing variable
//! - `expr` - the value of the last expression statement is the result
//! - `a; b; c` - statements separated by semicolons
//!
//! Expressions support:
//!
//! - `true`, `false`, integers, `"strings"` - literals
//! - `name` - variable lookup
//! - `!expr`, `expr && expr`, `expr || expr` - logic (AND binds tighter)
//! - `==`, `!=`, `<`, `<=`, `>`, `>=` - comparison
//! - `a + b`, `a - b` - integer arithmetic, `+` also concatenates strings
//! - `(expr)` - grouping
//!
//! Examples:
//! - `ready && count > 3`
//! - `count = count + 1; status = "busy"`
//! - `!(mode == "off")`

use crate::code::Code;
use crate::error::CoreError;
use crate::evaluator::{Bindings, Evaluator};
use crate::variable::Value;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Var(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
}

/// A parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign(String, Expr),
    Expr(Expr),
}

/// A parsed code fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    /// Parses source text.
    pub fn parse(source: &str) -> Result<Self, CoreError> {
        Parser::new(source).parse_program()
    }

    /// Runs the program against bindings.
    pub fn run(&self, bindings: &mut Bindings) -> Result<Value, CoreError> {
        let mut result = Value::Void;
        for stmt in &self.statements {
            match stmt {
                Stmt::Assign(name, expr) => {
                    let value = expr.evaluate(bindings)?;
                    bindings.assign(name, value)?;
                    result = Value::Void;
                }
                Stmt::Expr(expr) => {
                    result = expr.evaluate(bindings)?;
                }
            }
        }
        Ok(result)
    }
}

impl Expr {
    /// Evaluates the expression.
    pub fn evaluate(&self, bindings: &Bindings) -> Result<Value, CoreError> {
        match self {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Var(name) => bindings
                .value(name)
                .cloned()
                .ok_or_else(|| CoreError::evaluation(format!("unknown variable '{}'", name))),
            Expr::Not(inner) => Ok(Value::Bool(!as_bool(inner.evaluate(bindings)?, "!")?)),
            Expr::And(left, right) => {
                if !as_bool(left.evaluate(bindings)?, "&&")? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(as_bool(right.evaluate(bindings)?, "&&")?))
            }
            Expr::Or(left, right) => {
                if as_bool(left.evaluate(bindings)?, "||")? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(as_bool(right.evaluate(bindings)?, "||")?))
            }
            Expr::Cmp(op, left, right) => {
                compare(*op, left.evaluate(bindings)?, right.evaluate(bindings)?)
            }
            Expr::Add(left, right) => match (left.evaluate(bindings)?, right.evaluate(bindings)?) {
                (Value::Int(a), Value::Int(b)) => a
                    .checked_add(b)
                    .map(Value::Int)
                    .ok_or_else(|| CoreError::evaluation("integer overflow")),
                (Value::String(a), b) => Ok(Value::String(format!("{}{}", a, b))),
                (a, Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
                (a, b) => Err(CoreError::evaluation(format!(
                    "cannot add {} and {}",
                    a.var_type(),
                    b.var_type()
                ))),
            },
            Expr::Sub(left, right) => match (left.evaluate(bindings)?, right.evaluate(bindings)?) {
                (Value::Int(a), Value::Int(b)) => a
                    .checked_sub(b)
                    .map(Value::Int)
                    .ok_or_else(|| CoreError::evaluation("integer overflow")),
                (a, b) => Err(CoreError::evaluation(format!(
                    "cannot subtract {} from {}",
                    b.var_type(),
                    a.var_type()
                ))),
            },
        }
    }
}

fn as_bool(value: Value, op: &str) -> Result<bool, CoreError> {
    value.as_bool().ok_or_else(|| {
        CoreError::evaluation(format!(
            "operand of '{}' must be bool, got {}",
            op,
            value.var_type()
        ))
    })
}

fn compare(op: CmpOp, left: Value, right: Value) -> Result<Value, CoreError> {
    if left.var_type() != right.var_type() {
        return Err(CoreError::evaluation(format!(
            "cannot compare {} with {}",
            left.var_type(),
            right.var_type()
        )));
    }

    let result = match (op, &left, &right) {
        (CmpOp::Eq, _, _) => left == right,
        (CmpOp::Ne, _, _) => left != right,
        (CmpOp::Lt, Value::Int(a), Value::Int(b)) => a < b,
        (CmpOp::Le, Value::Int(a), Value::Int(b)) => a <= b,
        (CmpOp::Gt, Value::Int(a), Value::Int(b)) => a > b,
        (CmpOp::Ge, Value::Int(a), Value::Int(b)) => a >= b,
        _ => {
            return Err(CoreError::evaluation(format!(
                "ordering comparison needs ints, got {}",
                left.var_type()
            )))
        }
    };

    Ok(Value::Bool(result))
}

/// Evaluator for the built-in expression language.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExprEvaluator;

impl ExprEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for ExprEvaluator {
    fn evaluate(&self, code: &Code, bindings: &mut Bindings) -> Result<Value, CoreError> {
        Program::parse(&code.source)?.run(bindings)
    }
}

/// Deepest expression tree the parser builds.
const MAX_DEPTH: usize = 256;

/// Recursive descent parser.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn descend(&mut self) -> Result<(), CoreError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CoreError::evaluation("expression nested too deeply"));
        }
        Ok(())
    }

    fn parse_program(&mut self) -> Result<Program, CoreError> {
        let mut statements = Vec::new();

        loop {
            self.skip_whitespace();
            if self.at_end() {
                break;
            }
            if self.peek_char() == Some(';') {
                self.pos += 1;
                continue;
            }

            statements.push(self.parse_statement()?);

            self.skip_whitespace();
            match self.peek_char() {
                None => break,
                Some(';') => self.pos += 1,
                Some(c) => {
                    return Err(CoreError::evaluation(format!(
                        "unexpected '{}' at offset {}",
                        c, self.pos
                    )))
                }
            }
        }

        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> Result<Stmt, CoreError> {
        let start = self.pos;

        if let Some(name) = self.parse_identifier() {
            self.skip_whitespace();
            if self.peek_char() == Some('=') && !self.peek_str("==") {
                self.pos += 1;
                let expr = self.parse_expr()?;
                return Ok(Stmt::Assign(name, expr));
            }
        }

        self.pos = start;
        Ok(Stmt::Expr(self.parse_expr()?))
    }

    fn parse_expr(&mut self) -> Result<Expr, CoreError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, CoreError> {
        let base = self.depth;
        let mut left = self.parse_and()?;
        self.skip_whitespace();

        while self.peek_str("||") {
            self.pos += 2;
            self.descend()?;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
            self.skip_whitespace();
        }

        self.depth = base;
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, CoreError> {
        let base = self.depth;
        let mut left = self.parse_unary()?;
        self.skip_whitespace();

        while self.peek_str("&&") {
            self.pos += 2;
            self.descend()?;
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
            self.skip_whitespace();
        }

        self.depth = base;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, CoreError> {
        self.skip_whitespace();

        if self.peek_char() == Some('!') && !self.peek_str("!=") {
            self.pos += 1;
            self.descend()?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }

        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, CoreError> {
        let left = self.parse_additive()?;
        self.skip_whitespace();

        let op = if self.peek_str("==") {
            Some((CmpOp::Eq, 2))
        } else if self.peek_str("!=") {
            Some((CmpOp::Ne, 2))
        } else if self.peek_str("<=") {
            Some((CmpOp::Le, 2))
        } else if self.peek_str(">=") {
            Some((CmpOp::Ge, 2))
        } else if self.peek_char() == Some('<') {
            Some((CmpOp::Lt, 1))
        } else if self.peek_char() == Some('>') {
            Some((CmpOp::Gt, 1))
        } else {
            None
        };

        match op {
            Some((op, len)) => {
                self.pos += len;
                let right = self.parse_additive()?;
                Ok(Expr::Cmp(op, Box::new(left), Box::new(right)))
            }
            None => Ok(left),
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, CoreError> {
        let base = self.depth;
        let mut left = self.parse_primary()?;
        self.skip_whitespace();

        loop {
            match self.peek_char() {
                Some('+') => {
                    self.pos += 1;
                    self.descend()?;
                    let right = self.parse_primary()?;
                    left = Expr::Add(Box::new(left), Box::new(right));
                }
                Some('-') => {
                    self.pos += 1;
                    self.descend()?;
                    let right = self.parse_primary()?;
                    left = Expr::Sub(Box::new(left), Box::new(right));
                }
                _ => break,
            }
            self.skip_whitespace();
        }

        self.depth = base;
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr, CoreError> {
        self.skip_whitespace();

        match self.peek_char() {
            Some('(') => {
                self.pos += 1;
                self.descend()?;
                let expr = self.parse_expr()?;
                self.skip_whitespace();
                if self.peek_char() != Some(')') {
                    return Err(CoreError::evaluation("expected ')'"));
                }
                self.pos += 1;
                self.depth -= 1;
                Ok(expr)
            }
            Some('"') => self.parse_string(),
            Some(c) if c.is_ascii_digit() || c == '-' => self.parse_number(),
            Some(_) => match self.parse_identifier() {
                Some(word) if word == "true" => Ok(Expr::Literal(Value::Bool(true))),
                Some(word) if word == "false" => Ok(Expr::Literal(Value::Bool(false))),
                Some(word) => Ok(Expr::Var(word)),
                None => Err(CoreError::evaluation(format!(
                    "unexpected input at offset {}",
                    self.pos
                ))),
            },
            None => Err(CoreError::evaluation("unexpected end of expression")),
        }
    }

    fn parse_identifier(&mut self) -> Option<String> {
        self.skip_whitespace();
        let start = self.pos;

        match self.peek_char() {
            Some(c) if c.is_alphabetic() || c == '_' => {}
            _ => return None,
        }

        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }

        Some(self.input[start..self.pos].to_string())
    }

    fn parse_string(&mut self) -> Result<Expr, CoreError> {
        self.pos += 1;
        let mut out = String::new();

        while let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
            match c {
                '"' => return Ok(Expr::Literal(Value::String(out))),
                '\\' => {
                    if let Some(next) = self.peek_char() {
                        self.pos += next.len_utf8();
                        out.push(next);
                    }
                }
                c => out.push(c),
            }
        }

        Err(CoreError::evaluation("unterminated string"))
    }

    fn parse_number(&mut self) -> Result<Expr, CoreError> {
        let start = self.pos;

        if self.peek_char() == Some('-') {
            self.pos += 1;
        }

        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else {
                break;
            }
        }

        let num_str = &self.input[start..self.pos];
        num_str
            .parse::<i64>()
            .map(|n| Expr::Literal(Value::Int(n)))
            .map_err(|_| CoreError::evaluation(format!("invalid number: '{}'", num_str)))
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_str(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }
}
