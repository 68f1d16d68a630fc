//! A small arithmetic expression language for model members.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr  := term (('+' | '-') term)*
//! term  := unary (('*' | '/') unary)*
//! unary := ('-' | '+') unary | power
//! power := atom (('^' | '**') unary)?
//! atom  := number | ident | ident '(' expr (',' expr)* ')' | '(' expr ')'
//! ```
//!
//! `pi` and `e` are constants. Function names are resolved at parse time so
//! an unknown function or a wrong argument count is reported before anything
//! is evaluated.

use std::fmt;

use thiserror::Error;

/// Identifiers that always denote a constant and can never name a parameter.
pub const CONSTANTS: [(&str, f64); 2] = [("pi", std::f64::consts::PI), ("e", std::f64::consts::E)];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character '{ch}' at {pos}")]
    UnexpectedChar { pos: usize, ch: char },
    #[error("invalid number '{text}' at {pos}")]
    InvalidNumber { pos: usize, text: String },
    #[error("unexpected {found} at {pos}")]
    UnexpectedToken { pos: usize, found: String },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("function '{name}' takes {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("symbol '{0}' is not a declared parameter")]
    UnboundSymbol(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func1 {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Log10,
    Sqrt,
    Abs,
    Floor,
    Ceil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func2 {
    Pow,
    Atan2,
    Min,
    Max,
    Hypot,
}

impl Func1 {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Func1::Sin,
            "cos" => Func1::Cos,
            "tan" => Func1::Tan,
            "asin" => Func1::Asin,
            "acos" => Func1::Acos,
            "atan" => Func1::Atan,
            "sinh" => Func1::Sinh,
            "cosh" => Func1::Cosh,
            "tanh" => Func1::Tanh,
            "exp" => Func1::Exp,
            "ln" | "log" => Func1::Ln,
            "log10" => Func1::Log10,
            "sqrt" => Func1::Sqrt,
            "abs" => Func1::Abs,
            "floor" => Func1::Floor,
            "ceil" => Func1::Ceil,
            _ => return None,
        })
    }

    fn apply(self, x: f64) -> f64 {
        match self {
            Func1::Sin => x.sin(),
            Func1::Cos => x.cos(),
            Func1::Tan => x.tan(),
            Func1::Asin => x.asin(),
            Func1::Acos => x.acos(),
            Func1::Atan => x.atan(),
            Func1::Sinh => x.sinh(),
            Func1::Cosh => x.cosh(),
            Func1::Tanh => x.tanh(),
            Func1::Exp => x.exp(),
            Func1::Ln => x.ln(),
            Func1::Log10 => x.log10(),
            Func1::Sqrt => x.sqrt(),
            Func1::Abs => x.abs(),
            Func1::Floor => x.floor(),
            Func1::Ceil => x.ceil(),
        }
    }
}

impl Func2 {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "pow" => Func2::Pow,
            "atan2" => Func2::Atan2,
            "min" => Func2::Min,
            "max" => Func2::Max,
            "hypot" => Func2::Hypot,
            _ => return None,
        })
    }

    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Func2::Pow => a.powf(b),
            Func2::Atan2 => a.atan2(b),
            Func2::Min => a.min(b),
            Func2::Max => a.max(b),
            Func2::Hypot => a.hypot(b),
        }
    }
}

/// Expression tree, generic over how variables are referenced
/// (`String` after parsing, slot index after binding).
#[derive(Debug, Clone, PartialEq)]
enum Node<V> {
    Num(f64),
    Var(V),
    Neg(Box<Node<V>>),
    Bin(BinOp, Box<Node<V>>, Box<Node<V>>),
    Call1(Func1, Box<Node<V>>),
    Call2(Func2, Box<Node<V>>, Box<Node<V>>),
}

impl<V> Node<V> {
    fn map_vars<W, E>(&self, f: &mut impl FnMut(&V) -> Result<W, E>) -> Result<Node<W>, E> {
        Ok(match self {
            Node::Num(v) => Node::Num(*v),
            Node::Var(v) => Node::Var(f(v)?),
            Node::Neg(a) => Node::Neg(Box::new(a.map_vars(f)?)),
            Node::Bin(op, a, b) => Node::Bin(*op, Box::new(a.map_vars(f)?), Box::new(b.map_vars(f)?)),
            Node::Call1(func, a) => Node::Call1(*func, Box::new(a.map_vars(f)?)),
            Node::Call2(func, a, b) => {
                Node::Call2(*func, Box::new(a.map_vars(f)?), Box::new(b.map_vars(f)?))
            }
        })
    }

    fn visit_vars<'a>(&'a self, f: &mut impl FnMut(&'a V)) {
        match self {
            Node::Num(_) => {}
            Node::Var(v) => f(v),
            Node::Neg(a) | Node::Call1(_, a) => a.visit_vars(f),
            Node::Bin(_, a, b) | Node::Call2(_, a, b) => {
                a.visit_vars(f);
                b.visit_vars(f);
            }
        }
    }
}

impl Node<usize> {
    fn eval(&self, args: &[f64]) -> f64 {
        match self {
            Node::Num(v) => *v,
            Node::Var(slot) => args.get(*slot).copied().unwrap_or(f64::NAN),
            Node::Neg(a) => -a.eval(args),
            Node::Bin(op, a, b) => {
                let (a, b) = (a.eval(args), b.eval(args));
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::Pow => a.powf(b),
                }
            }
            Node::Call1(func, a) => func.apply(a.eval(args)),
            Node::Call2(func, a, b) => func.apply(a.eval(args), b.eval(args)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num(f64),
    Ident(String),
    Op(char),
    Pow,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tok::Num(v) => write!(f, "number {v}"),
            Tok::Ident(name) => write!(f, "'{name}'"),
            Tok::Op(c) => write!(f, "'{c}'"),
            Tok::Pow => write!(f, "'^'"),
            Tok::LParen => write!(f, "'('"),
            Tok::RParen => write!(f, "')'"),
            Tok::Comma => write!(f, "','"),
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<(usize, Tok)>, ExprError> {
    let chars: Vec<char> = src.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())) {
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            // Exponent suffix: 1e-3, 2.5E+4
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().collect();
            let value = text
                .parse::<f64>()
                .map_err(|_| ExprError::InvalidNumber { pos: start, text })?;
            out.push((start, Tok::Num(value)));
            continue;
        }
        if c.is_alphabetic() || c == '_' {
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            out.push((start, Tok::Ident(chars[start..i].iter().collect())));
            continue;
        }
        let tok = match c {
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                Tok::Pow
            }
            '^' => Tok::Pow,
            '+' | '-' | '*' | '/' => Tok::Op(c),
            '(' => Tok::LParen,
            ')' => Tok::RParen,
            ',' => Tok::Comma,
            _ => return Err(ExprError::UnexpectedChar { pos: i, ch: c }),
        };
        out.push((start, tok));
        i += 1;
    }
    Ok(out)
}

struct Parser {
    toks: Vec<(usize, Tok)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos).map(|(_, t)| t)
    }

    fn next(&mut self) -> Option<(usize, Tok)> {
        let tok = self.toks.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, want: Tok) -> Result<(), ExprError> {
        match self.next() {
            Some((_, tok)) if tok == want => Ok(()),
            Some((pos, tok)) => Err(ExprError::UnexpectedToken {
                pos,
                found: tok.to_string(),
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn expr(&mut self) -> Result<Node<String>, ExprError> {
        let mut lhs = self.term()?;
        while let Some(Tok::Op(c @ ('+' | '-'))) = self.peek() {
            let op = if *c == '+' { BinOp::Add } else { BinOp::Sub };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Node::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Node<String>, ExprError> {
        let mut lhs = self.unary()?;
        while let Some(Tok::Op(c @ ('*' | '/'))) = self.peek() {
            let op = if *c == '*' { BinOp::Mul } else { BinOp::Div };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Node::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Node<String>, ExprError> {
        match self.peek() {
            Some(Tok::Op('-')) => {
                self.pos += 1;
                Ok(Node::Neg(Box::new(self.unary()?)))
            }
            Some(Tok::Op('+')) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Node<String>, ExprError> {
        let base = self.atom()?;
        if let Some(Tok::Pow) = self.peek() {
            self.pos += 1;
            let exp = self.unary()?;
            return Ok(Node::Bin(BinOp::Pow, Box::new(base), Box::new(exp)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Node<String>, ExprError> {
        match self.next() {
            Some((_, Tok::Num(v))) => Ok(Node::Num(v)),
            Some((_, Tok::LParen)) => {
                let inner = self.expr()?;
                self.expect(Tok::RParen)?;
                Ok(inner)
            }
            Some((_, Tok::Ident(name))) => {
                if let Some(Tok::LParen) = self.peek() {
                    self.pos += 1;
                    let args = self.args()?;
                    return call(name, args);
                }
                Ok(match CONSTANTS.iter().find(|(c, _)| *c == name) {
                    Some(&(_, value)) => Node::Num(value),
                    None => Node::Var(name),
                })
            }
            Some((pos, tok)) => Err(ExprError::UnexpectedToken {
                pos,
                found: tok.to_string(),
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn args(&mut self) -> Result<Vec<Node<String>>, ExprError> {
        let mut args = vec![self.expr()?];
        loop {
            match self.next() {
                Some((_, Tok::Comma)) => args.push(self.expr()?),
                Some((_, Tok::RParen)) => return Ok(args),
                Some((pos, tok)) => {
                    return Err(ExprError::UnexpectedToken {
                        pos,
                        found: tok.to_string(),
                    });
                }
                None => return Err(ExprError::UnexpectedEnd),
            }
        }
    }
}

fn call(name: String, mut args: Vec<Node<String>>) -> Result<Node<String>, ExprError> {
    let (expected, node) = if let Some(func) = Func1::lookup(&name) {
        (1, (args.len() == 1).then(|| Node::Call1(func, Box::new(args.remove(0)))))
    } else if let Some(func) = Func2::lookup(&name) {
        let node = (args.len() == 2).then(|| {
            let b = args.remove(1);
            let a = args.remove(0);
            Node::Call2(func, Box::new(a), Box::new(b))
        });
        (2, node)
    } else {
        return Err(ExprError::UnknownFunction(name));
    };
    let found = args.len();
    node.ok_or(ExprError::Arity {
        name,
        expected,
        found,
    })
}

/// A parsed expression with named free symbols.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Node<String>,
}

impl Expression {
    pub fn parse(src: &str) -> Result<Self, ExprError> {
        let toks = tokenize(src)?;
        if toks.is_empty() {
            return Err(ExprError::Empty);
        }
        let mut parser = Parser { toks, pos: 0 };
        let root = parser.expr()?;
        if let Some((pos, tok)) = parser.next() {
            return Err(ExprError::UnexpectedToken {
                pos,
                found: tok.to_string(),
            });
        }
        Ok(Self {
            source: src.trim().to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Free symbols in order of first appearance.
    pub fn free_symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        self.root.visit_vars(&mut |name: &String| {
            if !out.contains(name) {
                out.push(name.clone());
            }
        });
        out
    }

    /// Resolve every symbol to its position in `params`.
    pub fn bind(&self, params: &[String]) -> Result<BoundExpression, ExprError> {
        let root = self.root.map_vars(&mut |name: &String| {
            params
                .iter()
                .position(|p| p == name)
                .ok_or_else(|| ExprError::UnboundSymbol(name.clone()))
        })?;
        Ok(BoundExpression {
            arity: params.len(),
            root,
        })
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// An expression whose symbols are positional argument slots.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundExpression {
    arity: usize,
    root: Node<usize>,
}

impl BoundExpression {
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn eval(&self, args: &[f64]) -> f64 {
        self.root.eval(args)
    }
}
